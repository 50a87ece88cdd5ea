//! Quality gate controller
//!
//! Single consumer of the label queue. Labels from the two sources arrive
//! independently; once `report_size` uuids carry both labels the gate:
//!
//! 1. fetches every pair, oldest classifier label first;
//! 2. builds the [`EvaluationReport`] and archives it when configured;
//! 3. asks the [`Decider`] for approval;
//! 4. sends a rejected report to the orchestrator;
//! 5. purges the consumed pairs, whatever the decision.

use crate::archive::ReportArchive;
use crate::config::GateThresholds;
use crate::decision::Decider;
use crate::label_store::LabelStore;
use crate::report::EvaluationReport;
use pmon_common::models::Label;
use pmon_common::outbound::{send_json, Outbound};
use pmon_common::{QueueMessage, QueueReceiver};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What one dequeued label led to
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Label could not be stored and is lost
    StoreFailed { uuid: String },
    /// Label stored; pairs could not be counted or fetched
    Stored { uuid: String },
    /// Label stored; window not full yet
    Waiting { pairs: i64 },
    /// A window was evaluated and purged
    Evaluated {
        approved: bool,
        report: Box<EvaluationReport>,
    },
}

pub struct QualityGate {
    store: LabelStore,
    thresholds: GateThresholds,
    decider: Arc<dyn Decider>,
    outbound: Arc<dyn Outbound>,
    orchestrator_url: String,
    archive: Option<ReportArchive>,
}

impl QualityGate {
    pub fn new(
        store: LabelStore,
        thresholds: GateThresholds,
        decider: Arc<dyn Decider>,
        outbound: Arc<dyn Outbound>,
        orchestrator_url: String,
    ) -> Self {
        Self {
            store,
            thresholds,
            decider,
            outbound,
            orchestrator_url,
            archive: None,
        }
    }

    /// Also write every report under the archive directory
    pub fn with_archive(mut self, archive: ReportArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    /// Drain the label queue until every producer is gone
    pub async fn run(self, mut queue: QueueReceiver<Label>) {
        info!(
            report_size = self.thresholds.report_size,
            "Quality gate started, waiting for labels"
        );

        while let Some(message) = queue.next().await {
            match message {
                QueueMessage::Start => info!("Received start signal"),
                QueueMessage::Item(label) => {
                    let outcome = self.handle_label(label).await;
                    debug!(?outcome, "Label processed");
                }
            }
        }

        info!("Label queue closed, quality gate stopping");
    }

    /// Store one label and evaluate the window once it is full
    pub async fn handle_label(&self, label: Label) -> GateOutcome {
        if let Err(e) = self.store.store_label(&label).await {
            error!(uuid = %label.uuid, source = %label.label_source, "Failed to store label: {}", e);
            return GateOutcome::StoreFailed { uuid: label.uuid };
        }

        let pairs = match self.store.pair_count().await {
            Ok(pairs) => pairs,
            Err(e) => {
                error!("Failed to count label pairs: {}", e);
                return GateOutcome::Stored { uuid: label.uuid };
            }
        };
        info!("Current label pairs: {}/{}", pairs, self.thresholds.report_size);

        if pairs < i64::from(self.thresholds.report_size) {
            return GateOutcome::Waiting { pairs };
        }

        match self.evaluate_window().await {
            Some((approved, report)) => GateOutcome::Evaluated {
                approved,
                report: Box::new(report),
            },
            None => GateOutcome::Stored { uuid: label.uuid },
        }
    }

    async fn evaluate_window(&self) -> Option<(bool, EvaluationReport)> {
        let pairs = match self.store.get_pairs().await {
            Ok(pairs) if pairs.is_empty() => {
                warn!("No label pairs retrieved from the store");
                return None;
            }
            Ok(pairs) => pairs,
            Err(e) => {
                error!("Failed to fetch label pairs: {}", e);
                return None;
            }
        };

        info!("Generating evaluation report for {} label pairs", pairs.len());
        let report = EvaluationReport::from_pairs(&pairs, &self.thresholds);
        let summary = report.summary();
        info!(
            total_labels = summary.total_labels,
            total_errors = summary.total_errors,
            error_rate = %format!("{:.2}%", summary.error_rate * 100.0),
            max_consecutive_errors = summary.max_consecutive_errors,
            "Evaluation report {}",
            if summary.is_valid { "VALID" } else { "INVALID" }
        );

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save(&report).await {
                error!("Failed to archive evaluation report: {}", e);
            }
        }

        let approved = self.decider.decide(&report).await;
        if approved {
            info!("Evaluation report approved");
        } else {
            info!("Evaluation report rejected, notifying the orchestrator");
            match send_json(self.outbound.as_ref(), &self.orchestrator_url, &report).await {
                Ok(()) => info!("Evaluation report sent to the orchestrator"),
                Err(e) => error!("Failed to send evaluation report: {}", e),
            }
        }

        let uuids = report.uuids();
        match self.store.remove_labels(&uuids).await {
            Ok(_) => info!("Processed labels removed from the store"),
            Err(e) => error!("Failed to remove processed labels: {}", e),
        }

        Some((approved, report))
    }
}
