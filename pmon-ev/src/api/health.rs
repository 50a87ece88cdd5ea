//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use pmon_common::api::HealthResponse;

use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        "pmon-ev",
        env!("CARGO_PKG_VERSION"),
        state.queue.depth(),
    ))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
