//! Bootstrap configuration for pmon-ev
//!
//! ```toml
//! port = 5000
//! orchestrator_url = "http://127.0.0.1:6000/evaluationReport"
//! report_dir = "reports"
//!
//! [gate]
//! report_size = 50
//! max_errors = 10
//! max_consecutive_errors = 3
//!
//! [decision]
//! mode = "interactive"   # interactive | random | threshold
//! approve_probability = 0.01
//! ```

use pmon_common::config::{LoggingConfig, OutboundConfig};
use pmon_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Label store file; in-memory when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub gate: GateThresholds,

    #[serde(default)]
    pub decision: DecisionConfig,

    /// Receives rejected reports
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,

    /// Reports are archived here as JSON when set
    #[serde(default)]
    pub report_dir: Option<PathBuf>,

    #[serde(default = "default_outbound")]
    pub outbound: OutboundConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            database_path: None,
            gate: GateThresholds::default(),
            decision: DecisionConfig::default(),
            orchestrator_url: default_orchestrator_url(),
            report_dir: None,
            outbound: default_outbound(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Quality gate window and thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GateThresholds {
    /// Pairs accumulated before a report is produced
    #[serde(default = "default_report_size")]
    pub report_size: u32,
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            report_size: default_report_size(),
            max_errors: default_max_errors(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    /// Operator answers y/n on the console
    #[default]
    Interactive,
    /// Weighted coin flip, for unattended load runs
    Random,
    /// Approve exactly the reports that meet both thresholds
    Threshold,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    #[serde(default)]
    pub mode: DecisionMode,

    /// Approval probability in `random` mode
    #[serde(default = "default_approve_probability")]
    pub approve_probability: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            mode: DecisionMode::default(),
            approve_probability: default_approve_probability(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_report_size() -> u32 {
    50
}

fn default_max_errors() -> u32 {
    10
}

fn default_max_consecutive_errors() -> u32 {
    3
}

fn default_approve_probability() -> f64 {
    0.01
}

fn default_orchestrator_url() -> String {
    "http://127.0.0.1:6000/evaluationReport".to_string()
}

fn default_outbound() -> OutboundConfig {
    OutboundConfig { timeout_ms: 5000 }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gate.report_size == 0 {
            return Err(Error::Config("gate.report_size must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.decision.approve_probability) {
            return Err(Error::Config(format!(
                "decision.approve_probability must be within [0, 1], got {}",
                self.decision.approve_probability
            )));
        }
        if !(self.orchestrator_url.starts_with("http://")
            || self.orchestrator_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "orchestrator_url is not an http(s) URL: {}",
                self.orchestrator_url
            )));
        }
        self.outbound.validate()
    }
}
