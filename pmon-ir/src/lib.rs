//! pmon-ir library - Input relay
//!
//! Entry point of the pipeline: forwards telemetry records to ingestion and
//! keeps an append-only log of when each record passed through each stage.
//! Also receives the classifier labels and rejected evaluation reports the
//! pipeline routes back to it.

use axum::Router;
use pmon_common::{Outbound, QueueSender};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod timestamps;

use timestamps::TimestampEntry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub outbound: Arc<dyn Outbound>,
    pub ingestion_url: Arc<str>,
    /// Producer side of the timestamp queue
    pub timestamps: QueueSender<TimestampEntry>,
}

impl AppState {
    pub fn new(
        outbound: Arc<dyn Outbound>,
        ingestion_url: &str,
        timestamps: QueueSender<TimestampEntry>,
    ) -> Self {
        Self {
            outbound,
            ingestion_url: Arc::from(ingestion_url),
            timestamps,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/record", post(api::post_record))
        .route("/log", post(api::log))
        .route("/label", post(api::label))
        .route("/evaluationReport", post(api::evaluation_report))
        .route("/start", get(api::start))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
