//! Classification labels exchanged between ingestion, production and evaluation

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which subsystem produced a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    /// Expert ground truth, emitted by the ingestion stage
    Ingestion,
    /// Classifier output, emitted by the production stage
    Production,
}

impl LabelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSource::Ingestion => "ingestion",
            LabelSource::Production => "production",
        }
    }
}

impl fmt::Display for LabelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ingestion" => Ok(LabelSource::Ingestion),
            "production" => Ok(LabelSource::Production),
            other => Err(Error::InvalidInput(format!(
                "Invalid label_source: {}. Must be 'production' or 'ingestion'",
                other
            ))),
        }
    }
}

/// Label as stored by the evaluation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub uuid: String,
    pub label: String,
    pub label_source: LabelSource,
}

impl Label {
    pub fn new(uuid: impl Into<String>, label: impl Into<String>, label_source: LabelSource) -> Self {
        Self {
            uuid: uuid.into(),
            label: label.into(),
            label_source,
        }
    }
}

/// Body of `POST /classifierLabels`, `POST /expertLabels` and `POST /label`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPayload {
    pub uuid: String,
    pub label: String,
}

impl LabelPayload {
    pub fn validate(&self) -> Result<()> {
        if self.uuid.trim().is_empty() {
            return Err(Error::InvalidInput("uuid must not be empty".to_string()));
        }
        if self.label.trim().is_empty() {
            return Err(Error::InvalidInput("label must not be empty".to_string()));
        }
        Ok(())
    }

    /// Tag the payload with the source fixed by the endpoint it arrived on
    pub fn into_label(self, label_source: LabelSource) -> Label {
        Label {
            uuid: self.uuid,
            label: self.label,
            label_source,
        }
    }
}
