//! Label intake
//!
//! The endpoint fixes the label source: classifier output arrives on
//! `/classifierLabels`, expert ground truth (relayed by ingestion) on
//! `/expertLabels`.

use axum::{extract::State, Json};
use pmon_common::api::{Ack, ApiResult, ValidJson};
use pmon_common::models::{LabelPayload, LabelSource};
use tracing::debug;

use crate::AppState;

fn enqueue(state: &AppState, payload: LabelPayload, source: LabelSource) -> ApiResult<Json<Ack>> {
    payload.validate()?;
    debug!(uuid = %payload.uuid, source = %source, "Label received");
    state.queue.push(payload.into_label(source))?;
    Ok(Json(Ack::default()))
}

/// POST /classifierLabels
pub async fn classifier_labels(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LabelPayload>,
) -> ApiResult<Json<Ack>> {
    enqueue(&state, payload, LabelSource::Production)
}

/// POST /expertLabels
pub async fn expert_labels(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LabelPayload>,
) -> ApiResult<Json<Ack>> {
    enqueue(&state, payload, LabelSource::Ingestion)
}

/// GET /start
pub async fn start(State(state): State<AppState>) -> ApiResult<Json<Ack>> {
    state.queue.push_start()?;
    Ok(Json(Ack::default()))
}
