//! Telemetry records and assembled sessions

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One inbound telemetry record, correlated to its session by `uuid`
///
/// Wire format (`kind` selects the variant):
/// ```json
/// {"uuid": "s-1", "kind": "pressure", "index": 3, "value": 101.7}
/// {"uuid": "s-1", "kind": "label", "pressure_detected": "anomalous"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Correlation id shared by every record of one session
    pub uuid: String,

    #[serde(flatten)]
    pub reading: Reading,
}

/// Payload of a telemetry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    /// Sensor reading at position `index` of the session time series
    Pressure { index: u32, value: f64 },
    /// Expert ground truth for the whole session
    Label { pressure_detected: String },
}

impl TelemetrySample {
    pub fn pressure(uuid: impl Into<String>, index: u32, value: f64) -> Self {
        Self {
            uuid: uuid.into(),
            reading: Reading::Pressure { index, value },
        }
    }

    pub fn label(uuid: impl Into<String>, pressure_detected: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            reading: Reading::Label {
                pressure_detected: pressure_detected.into(),
            },
        }
    }

    /// Boundary validation applied before a record may enter a queue
    pub fn validate(&self) -> Result<()> {
        if self.uuid.trim().is_empty() {
            return Err(Error::InvalidInput("uuid must not be empty".to_string()));
        }
        match &self.reading {
            Reading::Pressure { value, .. } if !value.is_finite() => Err(Error::InvalidInput(
                "pressure value must be a finite number".to_string(),
            )),
            Reading::Label { pressure_detected } if pressure_detected.trim().is_empty() => Err(
                Error::InvalidInput("pressure_detected must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Pressure reading as held by a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureSample {
    pub index: u32,
    pub value: f64,
}

/// All records sharing one correlation id
///
/// `time_series` is filled in by the integrity check: one slot per expected
/// position, `null` where the reading was missing or implausible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSession {
    pub uuid: String,
    /// Pressure readings ordered by index
    pub samples: Vec<PressureSample>,
    /// Derived label carried by the session's label record
    pub pressure_detected: Option<String>,
    #[serde(default)]
    pub time_series: Vec<Option<f64>>,
}

impl RawSession {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            samples: Vec::new(),
            pressure_detected: None,
            time_series: Vec::new(),
        }
    }
}
