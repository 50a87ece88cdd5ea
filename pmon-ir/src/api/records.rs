//! Record relay and timestamp log

use axum::{extract::State, Json};
use pmon_common::api::{Ack, ApiResult, ValidJson};
use pmon_common::models::TelemetrySample;
use pmon_common::outbound::send_json;
use tracing::{debug, error};

use crate::timestamps::{LogPayload, TimestampEntry, INPUT_SYSTEM};
use crate::AppState;

/// POST /record
///
/// Forwards the record to ingestion within the outbound timeout. A failed
/// forward is reported to the caller as 502 and nothing is logged.
pub async fn post_record(
    State(state): State<AppState>,
    ValidJson(sample): ValidJson<TelemetrySample>,
) -> ApiResult<Json<Ack>> {
    sample.validate()?;

    if let Err(e) = send_json(state.outbound.as_ref(), &state.ingestion_url, &sample).await {
        error!(uuid = %sample.uuid, "Failed to forward record to ingestion: {}", e);
        return Err(e.into());
    }
    debug!(uuid = %sample.uuid, "Record forwarded to ingestion");

    state
        .timestamps
        .push(TimestampEntry::now(sample.uuid, INPUT_SYSTEM))?;
    Ok(Json(Ack::default()))
}

/// POST /log
pub async fn log(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LogPayload>,
) -> ApiResult<Json<Ack>> {
    let entry = payload.into_entry()?;
    debug!(record_id = %entry.record_id, source = %entry.system_source, "Received log");
    state.timestamps.push(entry)?;
    Ok(Json(Ack::default()))
}

/// GET /start
pub async fn start(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    state.timestamps.push_start()?;
    Ok(Json(Ack::default()))
}
