//! pmon-ig library - Ingestion stage
//!
//! Reassembles telemetry records into raw sessions, checks their integrity,
//! forwards them to the preparation stage and samples sessions for the
//! evaluation stage.

use axum::Router;
use pmon_common::models::TelemetrySample;
use pmon_common::QueueSender;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod assembler;
pub mod config;
pub mod integrity;
pub mod store;
pub mod window;

pub use assembler::{AssemblyOutcome, IngestRoutes, SessionAssembler};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the session queue
    pub queue: QueueSender<TelemetrySample>,
}

impl AppState {
    pub fn new(queue: QueueSender<TelemetrySample>) -> Self {
        Self { queue }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/record", post(api::post_record))
        .route("/start", get(api::start))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
