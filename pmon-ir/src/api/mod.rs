//! HTTP API handlers for pmon-ir

pub mod health;
pub mod receivers;
pub mod records;

pub use health::health_routes;
pub use receivers::{evaluation_report, label};
pub use records::{log, post_record, start};
