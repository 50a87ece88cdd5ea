//! Shared test helpers for pmon-ig integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pmon_common::db::open_in_memory;
use pmon_common::models::TelemetrySample;
use pmon_common::{Error, Outbound, Result};
use pmon_ig::config::SessionPolicy;
use pmon_ig::store::SessionStore;
use pmon_ig::IngestRoutes;
use serde_json::Value;
use std::sync::Mutex;

pub const PREPARATION_URL: &str = "http://preparation.test/record";
pub const EVALUATION_URL: &str = "http://evaluation.test/expertLabels";

/// Outbound double that records every send
#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<(String, Value)>>,
    fail: bool,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records sends but reports each one as failed
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, url: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|(u, _)| u == url)
            .map(|(_, body)| body)
            .collect()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        self.sent.lock().unwrap().push((url.to_string(), body.clone()));
        if self.fail {
            return Err(Error::Http(format!("{} unreachable", url)));
        }
        Ok(())
    }
}

pub fn policy(expected_samples: u32, max_missing_samples: u32) -> SessionPolicy {
    SessionPolicy {
        expected_samples,
        max_missing_samples,
        min_value: 0.0,
        max_value: 100.0,
    }
}

pub fn routes() -> IngestRoutes {
    IngestRoutes {
        preparation_url: PREPARATION_URL.to_string(),
        evaluation_url: EVALUATION_URL.to_string(),
    }
}

pub async fn test_store(policy: SessionPolicy) -> SessionStore {
    let pool = open_in_memory().await.expect("in-memory database");
    SessionStore::new(pool, policy).await.expect("session store schema")
}

/// Pressure readings for `uuid` at the given indices
pub fn readings(uuid: &str, indices: &[u32]) -> Vec<TelemetrySample> {
    indices
        .iter()
        .map(|&i| TelemetrySample::pressure(uuid, i, 40.0 + i as f64))
        .collect()
}
