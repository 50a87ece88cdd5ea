//! pmon-ev library - Evaluation stage
//!
//! Pairs classifier labels with expert labels and audits classifier quality
//! one window of pairs at a time.

use axum::Router;
use pmon_common::models::Label;
use pmon_common::QueueSender;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod archive;
pub mod config;
pub mod decision;
pub mod gate;
pub mod label_store;
pub mod report;

pub use gate::{GateOutcome, QualityGate};
pub use report::EvaluationReport;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the label queue
    pub queue: QueueSender<Label>,
}

impl AppState {
    pub fn new(queue: QueueSender<Label>) -> Self {
        Self { queue }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/classifierLabels", post(api::classifier_labels))
        .route("/expertLabels", post(api::expert_labels))
        .route("/start", get(api::start))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
