//! Telemetry intake
//!
//! Handlers only validate and enqueue; all session state is owned by the
//! assembler task on the other side of the queue.

use axum::{extract::State, Json};
use pmon_common::api::{Ack, ApiResult, ValidJson};
use pmon_common::models::TelemetrySample;
use tracing::debug;

use crate::AppState;

/// POST /record
pub async fn post_record(
    State(state): State<AppState>,
    ValidJson(sample): ValidJson<TelemetrySample>,
) -> ApiResult<Json<Ack>> {
    sample.validate()?;
    debug!(uuid = %sample.uuid, "Received record");
    state.queue.push(sample)?;
    Ok(Json(Ack::default()))
}

/// GET /start
pub async fn start(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    state.queue.push_start()?;
    Ok(Json(Ack::default()))
}
