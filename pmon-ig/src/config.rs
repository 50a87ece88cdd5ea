//! Bootstrap configuration for pmon-ig
//!
//! Loaded once at startup from TOML (see `pmon_common::config` for file
//! resolution). Every field has a built-in default; `validate()` failures
//! are fatal.
//!
//! ```toml
//! port = 4000
//! initial_mode = "production"
//! operative_mode = "production"
//!
//! [windows]
//! evaluation_window = 10
//! production_window = 50
//!
//! [session]
//! expected_samples = 20
//! max_missing_samples = 2
//!
//! [endpoints]
//! preparation_url = "http://127.0.0.1:4100/record"
//! evaluation_url = "http://127.0.0.1:5000/expertLabels"
//! ```

use crate::window::Mode;
use pmon_common::config::{LoggingConfig, OutboundConfig};
use pmon_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Whether the pipeline is collecting training data or serving production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperativeMode {
    /// Every session carries ground truth; evaluation mode is never re-entered
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Session store file; in-memory when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Mode the evaluation window starts in
    #[serde(default)]
    pub initial_mode: Mode,

    #[serde(default)]
    pub operative_mode: OperativeMode,

    #[serde(default)]
    pub windows: WindowConfig,

    #[serde(default)]
    pub session: SessionPolicy,

    #[serde(default)]
    pub endpoints: IngestEndpoints,

    #[serde(default)]
    pub outbound: OutboundConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            database_path: None,
            initial_mode: Mode::default(),
            operative_mode: OperativeMode::default(),
            windows: WindowConfig::default(),
            session: SessionPolicy::default(),
            endpoints: IngestEndpoints::default(),
            outbound: OutboundConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Evaluation/production window sizes, in completed sessions
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_evaluation_window")]
    pub evaluation_window: u32,
    #[serde(default = "default_production_window")]
    pub production_window: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            evaluation_window: default_evaluation_window(),
            production_window: default_production_window(),
        }
    }
}

/// Completeness and integrity thresholds for one session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionPolicy {
    /// Readings in a full session (indices `0..expected_samples`)
    #[serde(default = "default_expected_samples")]
    pub expected_samples: u32,

    /// Missing or implausible readings tolerated before a session is discarded
    #[serde(default = "default_max_missing_samples")]
    pub max_missing_samples: u32,

    /// Plausible reading range (inclusive)
    #[serde(default = "default_min_value")]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            expected_samples: default_expected_samples(),
            max_missing_samples: default_max_missing_samples(),
            min_value: default_min_value(),
            max_value: default_max_value(),
        }
    }
}

/// Downstream destinations
#[derive(Debug, Clone, Deserialize)]
pub struct IngestEndpoints {
    /// Receives every accepted session
    #[serde(default = "default_preparation_url")]
    pub preparation_url: String,

    /// Receives expert labels while in evaluation mode
    #[serde(default = "default_evaluation_url")]
    pub evaluation_url: String,
}

impl Default for IngestEndpoints {
    fn default() -> Self {
        Self {
            preparation_url: default_preparation_url(),
            evaluation_url: default_evaluation_url(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_evaluation_window() -> u32 {
    10
}

fn default_production_window() -> u32 {
    50
}

fn default_expected_samples() -> u32 {
    20
}

fn default_max_missing_samples() -> u32 {
    2
}

fn default_min_value() -> f64 {
    0.0
}

fn default_max_value() -> f64 {
    1000.0
}

fn default_preparation_url() -> String {
    "http://127.0.0.1:4100/record".to_string()
}

fn default_evaluation_url() -> String {
    "http://127.0.0.1:5000/expertLabels".to_string()
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.windows.evaluation_window == 0 || self.windows.production_window == 0 {
            return Err(Error::Config(
                "evaluation_window and production_window must be > 0".to_string(),
            ));
        }
        self.session.validate()?;
        for (name, url) in [
            ("preparation_url", &self.endpoints.preparation_url),
            ("evaluation_url", &self.endpoints.evaluation_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!("{} is not an http(s) URL: {}", name, url)));
            }
        }
        self.outbound.validate()
    }
}

impl SessionPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.expected_samples == 0 {
            return Err(Error::Config("expected_samples must be > 0".to_string()));
        }
        if self.max_missing_samples >= self.expected_samples {
            return Err(Error::Config(format!(
                "max_missing_samples ({}) must be lower than expected_samples ({})",
                self.max_missing_samples, self.expected_samples
            )));
        }
        if !(self.min_value < self.max_value) {
            return Err(Error::Config(format!(
                "min_value ({}) must be lower than max_value ({})",
                self.min_value, self.max_value
            )));
        }
        Ok(())
    }
}
