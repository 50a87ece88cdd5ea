//! Bootstrap configuration for pmon-ir
//!
//! ```toml
//! port = 3000
//! ingestion_url = "http://127.0.0.1:4000/record"
//! database_path = "logs/records.db"
//! ```

use pmon_common::config::{LoggingConfig, OutboundConfig};
use pmon_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Timestamp store file; in-memory when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Ingestion stage record endpoint
    #[serde(default = "default_ingestion_url")]
    pub ingestion_url: String,

    #[serde(default)]
    pub outbound: OutboundConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            database_path: None,
            ingestion_url: default_ingestion_url(),
            outbound: OutboundConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_ingestion_url() -> String {
    "http://127.0.0.1:4000/record".to_string()
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.ingestion_url.starts_with("http://") || self.ingestion_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "ingestion_url is not an http(s) URL: {}",
                self.ingestion_url
            )));
        }
        self.outbound.validate()
    }
}
