//! HTTP API handlers for pmon-ig

pub mod health;
pub mod records;

pub use health::health_routes;
pub use records::{post_record, start};
