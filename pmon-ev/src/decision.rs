//! Report approval
//!
//! The gate hands every report to a [`Decider`]. A rejected report is sent
//! to the orchestrator; the consumed labels are purged either way.

use crate::config::{DecisionConfig, DecisionMode};
use crate::report::EvaluationReport;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

#[async_trait]
pub trait Decider: Send + Sync {
    /// `true` approves the report
    async fn decide(&self, report: &EvaluationReport) -> bool;
}

/// Build the decider selected by configuration
pub fn from_config(config: &DecisionConfig) -> Arc<dyn Decider> {
    match config.mode {
        DecisionMode::Interactive => Arc::new(ConsoleDecider),
        DecisionMode::Random => Arc::new(WeightedRandomDecider::new(config.approve_probability)),
        DecisionMode::Threshold => Arc::new(ThresholdDecider),
    }
}

/// Operator review on the console
///
/// Blocks the label consumer until an answer is typed. End of input or a
/// console read or write error counts as a rejection.
pub struct ConsoleDecider;

#[async_trait]
impl Decider for ConsoleDecider {
    async fn decide(&self, report: &EvaluationReport) -> bool {
        let summary = report.summary();
        let banner = format!(
            "\n==================================================\n\
             EVALUATION REPORT\n\
             ==================================================\n\
             Total labels:           {}\n\
             Total errors:           {} (threshold {})\n\
             Error rate:             {:.2}%\n\
             Max consecutive errors: {} (threshold {})\n\
             Status:                 {}\n",
            summary.total_labels,
            summary.total_errors,
            report.max_errors_threshold,
            summary.error_rate * 100.0,
            summary.max_consecutive_errors,
            report.max_consecutive_errors_threshold,
            if summary.is_valid { "VALID" } else { "INVALID" },
        );

        let answer = tokio::task::spawn_blocking(move || {
            prompt_yes_no(&banner, std::io::stdin().lock(), std::io::stdout())
        })
        .await;
        match answer {
            Ok(Some(approved)) => approved,
            Ok(None) => {
                warn!("No answer on stdin, treating report as rejected");
                false
            }
            Err(e) => {
                error!("Approval prompt failed: {}", e);
                false
            }
        }
    }
}

/// Ask until the operator answers y/n; `None` on end of input or a console error
fn prompt_yes_no(banner: &str, mut input: impl BufRead, mut output: impl Write) -> Option<bool> {
    if let Err(e) = writeln!(output, "{}", banner) {
        warn!("Cannot write evaluation report to the console: {}", e);
        return None;
    }

    loop {
        let prompt = write!(output, "Is this evaluation report acceptable? [y/n]: ")
            .and_then(|()| output.flush());
        if let Err(e) = prompt {
            warn!("Cannot write approval prompt to the console: {}", e);
            return None;
        }

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => return None,
            Err(e) => {
                warn!("Cannot read approval answer: {}", e);
                return None;
            }
            Ok(_) => {}
        }

        if let Some(answer) = parse_answer(&line) {
            return Some(answer);
        }
        if let Err(e) = writeln!(output, "Please enter 'y' for yes or 'n' for no.") {
            warn!("Cannot write to the console: {}", e);
            return None;
        }
    }
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Unattended approval: approves with a fixed probability
pub struct WeightedRandomDecider {
    approve_probability: f64,
    rng: Mutex<StdRng>,
}

impl WeightedRandomDecider {
    pub fn new(approve_probability: f64) -> Self {
        Self::with_rng(approve_probability, StdRng::from_entropy())
    }

    /// Reproducible sequence of decisions
    pub fn seeded(approve_probability: f64, seed: u64) -> Self {
        Self::with_rng(approve_probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(approve_probability: f64, rng: StdRng) -> Self {
        let approve_probability = if approve_probability.is_nan() {
            0.0
        } else {
            approve_probability.clamp(0.0, 1.0)
        };
        Self {
            approve_probability,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl Decider for WeightedRandomDecider {
    async fn decide(&self, _report: &EvaluationReport) -> bool {
        let approved = match self.rng.lock() {
            Ok(mut rng) => rng.gen_bool(self.approve_probability),
            Err(poisoned) => poisoned.into_inner().gen_bool(self.approve_probability),
        };
        info!(approved, "Automated report decision");
        approved
    }
}

/// Approves exactly the reports that meet both thresholds
pub struct ThresholdDecider;

#[async_trait]
impl Decider for ThresholdDecider {
    async fn decide(&self, report: &EvaluationReport) -> bool {
        report.is_valid
    }
}
