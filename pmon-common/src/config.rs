//! Configuration loading and config file resolution
//!
//! Every service boots from a small TOML file. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PMON_<SERVICE>_CONFIG`)
//! 3. Per-user config file (`<config_dir>/pmon/<service>.toml`)
//! 4. System config file (`/etc/pmon/<service>.toml`)
//! 5. Built-in defaults (every field is defaulted)
//!
//! An explicitly named file (tiers 1 and 2) that cannot be read is fatal.
//! Missing default-location files are not: the service starts on defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundConfig {
    /// Per-request timeout for downstream sends
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    3000
}

impl OutboundConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("outbound.timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Where a configuration file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    DefaultLocation(PathBuf),
    BuiltIn,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::DefaultLocation(p) => Some(p),
            ConfigSource::BuiltIn => None,
        }
    }
}

/// Resolves the bootstrap config file for one service
pub struct ConfigResolver {
    service: String,
    env_var: String,
}

impl ConfigResolver {
    /// `service` is the short service name, e.g. "ingestion"
    pub fn new(service: &str, env_var: &str) -> Self {
        Self {
            service: service.to_string(),
            env_var: env_var.to_string(),
        }
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve the config source following the documented priority order
    pub fn resolve(&self, cli_arg: Option<&Path>) -> ConfigSource {
        if let Some(path) = cli_arg {
            return ConfigSource::CommandLine(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        let file_name = format!("{}.toml", self.service);
        let user_config = dirs::config_dir().map(|d| d.join("pmon").join(&file_name));
        if let Some(path) = user_config {
            if path.exists() {
                return ConfigSource::DefaultLocation(path);
            }
        }

        let system_config = PathBuf::from("/etc/pmon").join(&file_name);
        if system_config.exists() {
            return ConfigSource::DefaultLocation(system_config);
        }

        ConfigSource::BuiltIn
    }

    /// Resolve and load in one step
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<(T, ConfigSource)>
    where
        T: DeserializeOwned + Default,
    {
        let source = self.resolve(cli_arg);
        let config = match source.path() {
            Some(path) => load_toml_file(path)?,
            None => {
                info!("No {} config file found, using built-in defaults", self.service);
                T::default()
            }
        };
        Ok((config, source))
    }
}

/// Read and parse a TOML config file
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    parse_toml(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Parse TOML text into a config struct
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}
