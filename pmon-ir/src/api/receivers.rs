//! Terminal receivers for pipeline outputs routed back to the relay

use axum::Json;
use pmon_common::api::{Ack, ApiError, ApiResult, ValidJson};
use pmon_common::models::LabelPayload;
use serde_json::Value;
use tracing::{info, warn};

/// POST /label
pub async fn label(ValidJson(payload): ValidJson<LabelPayload>) -> ApiResult<Json<Ack>> {
    payload.validate()?;
    info!(uuid = %payload.uuid, label = %payload.label, "Received classifier label");
    Ok(Json(Ack::default()))
}

/// POST /evaluationReport
pub async fn evaluation_report(ValidJson(report): ValidJson<Value>) -> ApiResult<Json<Ack>> {
    if !report.is_object() {
        return Err(ApiError::BadRequest(
            "evaluation report must be a JSON object".to_string(),
        ));
    }

    warn!(
        total_labels = %report["total_labels"],
        total_errors = %report["total_errors"],
        max_consecutive_errors = %report["max_consecutive_errors_found"],
        is_valid = %report["is_valid"],
        "Received rejected evaluation report"
    );
    Ok(Json(Ack::default()))
}
