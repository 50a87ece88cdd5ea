//! Raw session integrity check
//!
//! Lays the session's readings out on the expected index grid, marks every
//! slot without a plausible reading as missing, and accepts the session only
//! while the number of missing slots stays within tolerance.

use crate::config::SessionPolicy;
use pmon_common::models::PressureSample;
use tracing::debug;

/// Result of [`IntegrityChecker::mark_missing_samples`]
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityVerdict {
    /// One slot per expected index; `None` where missing or implausible
    pub time_series: Vec<Option<f64>>,
    pub missing: usize,
    pub accepted: bool,
}

pub struct IntegrityChecker {
    policy: SessionPolicy,
}

impl IntegrityChecker {
    pub fn new(policy: SessionPolicy) -> Self {
        Self { policy }
    }

    fn is_plausible(&self, value: f64) -> bool {
        value.is_finite() && value >= self.policy.min_value && value <= self.policy.max_value
    }

    pub fn mark_missing_samples(&self, samples: &[PressureSample]) -> IntegrityVerdict {
        let expected = self.policy.expected_samples as usize;
        let mut time_series: Vec<Option<f64>> = vec![None; expected];

        for sample in samples {
            let index = sample.index as usize;
            if index >= expected {
                debug!(index, expected, "Ignoring reading beyond the expected series length");
                continue;
            }
            if self.is_plausible(sample.value) {
                time_series[index] = Some(sample.value);
            } else {
                debug!(index, value = sample.value, "Implausible reading marked missing");
            }
        }

        let missing = time_series.iter().filter(|slot| slot.is_none()).count();
        let accepted = missing <= self.policy.max_missing_samples as usize;

        IntegrityVerdict {
            time_series,
            missing,
            accepted,
        }
    }
}
