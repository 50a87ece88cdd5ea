//! HTTP API handlers for pmon-ev

pub mod health;
pub mod labels;

pub use health::health_routes;
pub use labels::{classifier_labels, expert_labels, start};
