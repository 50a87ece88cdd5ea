//! Shared test helpers for pmon-ev integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pmon_common::db::open_in_memory;
use pmon_common::{Error, Outbound, Result};
use pmon_ev::config::GateThresholds;
use pmon_ev::decision::Decider;
use pmon_ev::label_store::LabelStore;
use pmon_ev::EvaluationReport;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const ORCHESTRATOR_URL: &str = "http://orchestrator.test/evaluationReport";

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
            return Err(Error::Http(format!("{} unreachable", url)));
        }
        Ok(())
    }
}

/// Decider answering from a script, recording the reports it saw
#[derive(Default)]
pub struct ScriptedDecider {
    answers: Mutex<VecDeque<bool>>,
    seen: Mutex<Vec<EvaluationReport>>,
}

impl ScriptedDecider {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<EvaluationReport> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Decider for ScriptedDecider {
    async fn decide(&self, report: &EvaluationReport) -> bool {
        self.seen.lock().unwrap().push(report.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .expect("decider asked more often than scripted")
    }
}

pub fn thresholds(report_size: u32, max_errors: u32, max_consecutive_errors: u32) -> GateThresholds {
    GateThresholds {
        report_size,
        max_errors,
        max_consecutive_errors,
    }
}

pub async fn test_store() -> LabelStore {
    let pool = open_in_memory().await.expect("in-memory database");
    LabelStore::new(pool).await.expect("label store schema")
}
