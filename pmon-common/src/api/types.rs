//! Shared API response types

use serde::{Deserialize, Serialize};

/// Health check response, returned by `GET /health` on every service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Messages waiting for the service's consumer task
    pub queue_depth: usize,
}

impl HealthResponse {
    pub fn ok(module: &str, version: &str, queue_depth: usize) -> Self {
        Self {
            status: "ok".to_string(),
            module: module.to_string(),
            version: version.to_string(),
            queue_depth,
        }
    }
}

/// Empty acknowledgement body (`{}`) returned once a payload is queued
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}
