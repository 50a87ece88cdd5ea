//! Evaluation report over one window of label pairs

use crate::config::GateThresholds;
use crate::label_store::LabelPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expert vs classifier outcome for one uuid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelComparison {
    pub uuid: String,
    pub expert_label: String,
    pub classifier_label: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub report_timestamp: DateTime<Utc>,
    pub total_labels: u32,
    pub total_errors: u32,
    pub max_consecutive_errors_found: u32,
    pub max_errors_threshold: u32,
    pub max_consecutive_errors_threshold: u32,
    pub is_valid: bool,
    pub label_comparisons: Vec<LabelComparison>,
}

/// Headline figures logged for every report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_labels: u32,
    pub total_errors: u32,
    pub error_rate: f64,
    pub max_consecutive_errors: u32,
    pub is_valid: bool,
}

impl EvaluationReport {
    /// Analyze `pairs` in the order given
    pub fn from_pairs(pairs: &[LabelPair], thresholds: &GateThresholds) -> Self {
        Self::from_pairs_at(pairs, thresholds, Utc::now())
    }

    pub fn from_pairs_at(
        pairs: &[LabelPair],
        thresholds: &GateThresholds,
        report_timestamp: DateTime<Utc>,
    ) -> Self {
        let mut total_errors = 0u32;
        let mut run = 0u32;
        let mut longest_run = 0u32;

        let label_comparisons: Vec<LabelComparison> = pairs
            .iter()
            .map(|pair| {
                let is_error = pair.is_error();
                if is_error {
                    total_errors += 1;
                    run += 1;
                    longest_run = longest_run.max(run);
                } else {
                    run = 0;
                }
                LabelComparison {
                    uuid: pair.uuid.clone(),
                    expert_label: pair.label_ingestion.clone(),
                    classifier_label: pair.label_production.clone(),
                    is_error,
                }
            })
            .collect();

        let is_valid = total_errors <= thresholds.max_errors
            && longest_run <= thresholds.max_consecutive_errors;

        Self {
            report_timestamp,
            total_labels: label_comparisons.len() as u32,
            total_errors,
            max_consecutive_errors_found: longest_run,
            max_errors_threshold: thresholds.max_errors,
            max_consecutive_errors_threshold: thresholds.max_consecutive_errors,
            is_valid,
            label_comparisons,
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let error_rate = if self.total_labels > 0 {
            self.total_errors as f64 / self.total_labels as f64
        } else {
            0.0
        };

        ReportSummary {
            total_labels: self.total_labels,
            total_errors: self.total_errors,
            error_rate,
            max_consecutive_errors: self.max_consecutive_errors_found,
            is_valid: self.is_valid,
        }
    }

    /// Uuids covered by this report, in report order
    pub fn uuids(&self) -> Vec<String> {
        self.label_comparisons.iter().map(|c| c.uuid.clone()).collect()
    }
}
