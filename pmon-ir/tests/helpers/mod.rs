//! Shared test helpers for pmon-ir integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pmon_common::{Error, Outbound, Result};
use serde_json::Value;
use std::sync::Mutex;

pub const INGESTION_URL: &str = "http://ingestion.test/record";

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

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        self.sent.lock().unwrap().push((url.to_string(), body.clone()));
        if self.fail {
            return Err(Error::Http(format!("{} responded 500", url)));
        }
        Ok(())
    }
}
