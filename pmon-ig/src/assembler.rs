//! Session assembler
//!
//! Single consumer of the session queue. Records arrive one at a time and in
//! arrival order; the assembler decides when a session is finished without
//! any timer:
//!
//! - a record for the tracked id re-checks that id's completeness;
//! - a record for a *different* id is a boundary: the tracked session will
//!   receive nothing more, so it is judged with `last_missing_sample = true`
//!   and either completed or abandoned.
//!
//! Only one session is pending a decision at a time. Records of a session
//! interleaved with more than one other session are not reassembled; such a
//! session is abandoned at the first boundary that finds it incomplete.
//!
//! Completed sessions pass the integrity check and are forwarded to the
//! preparation stage. While the evaluation window is in evaluation mode the
//! session's expert label is also sent to the evaluation stage.

use crate::config::OperativeMode;
use crate::integrity::IntegrityChecker;
use crate::store::SessionStore;
use crate::window::{EvaluationWindow, Mode};
use pmon_common::models::{LabelPayload, TelemetrySample};
use pmon_common::outbound::{send_json, Outbound};
use pmon_common::{QueueMessage, QueueReceiver};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Downstream URLs used by the assembler
#[derive(Debug, Clone)]
pub struct IngestRoutes {
    pub preparation_url: String,
    pub evaluation_url: String,
}

/// What one dequeued record led to
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyOutcome {
    /// Record could not be stored and is lost
    StoreFailed { uuid: String },
    /// First record after a cold start; the id is now tracked
    Tracking { uuid: String },
    /// Tracked session not complete yet
    Waiting { uuid: String },
    /// Session complete, accepted and forwarded
    Forwarded {
        uuid: String,
        /// Expert label sent to the evaluation stage
        labelled: bool,
        /// Mode entered because this session closed the window
        switched_to: Option<Mode>,
    },
    /// Session complete but failed the integrity check
    Discarded { uuid: String, missing: usize },
    /// Superseded by another id while incomplete; no recovery possible
    Abandoned { uuid: String },
    /// Session judged complete but could not be read back
    LoadFailed { uuid: String },
}

/// Result of comparing an arriving id to the tracked one
#[derive(Debug, Clone, PartialEq)]
enum Boundary {
    First,
    Same(String),
    Crossed { previous: String },
}

/// Tracks the most recently seen correlation id
#[derive(Debug, Default)]
struct BoundaryDetector {
    pending: Option<String>,
}

impl BoundaryDetector {
    fn observe(&mut self, uuid: &str) -> Boundary {
        match self.pending.take() {
            None => {
                self.pending = Some(uuid.to_string());
                Boundary::First
            }
            Some(previous) if previous == uuid => {
                self.pending = Some(previous);
                Boundary::Same(uuid.to_string())
            }
            Some(previous) => {
                self.pending = Some(uuid.to_string());
                Boundary::Crossed { previous }
            }
        }
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}

pub struct SessionAssembler {
    store: SessionStore,
    integrity: IntegrityChecker,
    outbound: Arc<dyn Outbound>,
    routes: IngestRoutes,
    window: EvaluationWindow,
    operative_mode: OperativeMode,
    boundary: BoundaryDetector,
}

impl SessionAssembler {
    pub fn new(
        store: SessionStore,
        integrity: IntegrityChecker,
        outbound: Arc<dyn Outbound>,
        routes: IngestRoutes,
        window: EvaluationWindow,
        operative_mode: OperativeMode,
    ) -> Self {
        Self {
            store,
            integrity,
            outbound,
            routes,
            window,
            operative_mode,
            boundary: BoundaryDetector::default(),
        }
    }

    pub fn window(&self) -> &EvaluationWindow {
        &self.window
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Id currently awaiting a decision
    pub fn pending_uuid(&self) -> Option<&str> {
        self.boundary.pending.as_deref()
    }

    /// Drain the session queue until every producer is gone
    pub async fn run(mut self, mut queue: QueueReceiver<TelemetrySample>) {
        info!(mode = %self.window.mode(), "Session assembler started");

        while let Some(message) = queue.next().await {
            match message {
                QueueMessage::Start => info!("Received start signal"),
                QueueMessage::Item(sample) => {
                    let outcome = self.handle_sample(sample).await;
                    debug!(?outcome, "Record processed");
                }
            }
        }

        info!("Session queue closed, assembler stopping");
    }

    /// Label records are required while sampling for evaluation, and always
    /// when collecting training data
    fn requires_label(&self) -> bool {
        self.window.is_evaluation() || self.operative_mode == OperativeMode::Development
    }

    /// Process one record through the assembly state machine
    pub async fn handle_sample(&mut self, sample: TelemetrySample) -> AssemblyOutcome {
        if let Err(e) = self.store.store_record(&sample).await {
            error!(uuid = %sample.uuid, "Failed to store record, record dropped: {}", e);
            return AssemblyOutcome::StoreFailed { uuid: sample.uuid };
        }

        let (uuid, last_missing_sample) = match self.boundary.observe(&sample.uuid) {
            Boundary::First => return AssemblyOutcome::Tracking { uuid: sample.uuid },
            Boundary::Same(uuid) => (uuid, false),
            Boundary::Crossed { previous } => {
                info!(uuid = %previous, next = %sample.uuid, "Raw session missing sample detected");
                (previous, true)
            }
        };

        let complete = match self
            .store
            .is_session_complete(&uuid, last_missing_sample, self.requires_label())
            .await
        {
            Ok(complete) => complete,
            Err(e) => {
                error!(uuid = %uuid, "Completeness check failed: {}", e);
                false
            }
        };

        if complete {
            self.boundary.reset();
            return self.complete_session(uuid).await;
        }

        if last_missing_sample {
            error!(uuid = %uuid, "Raw session not complete [no recovery possible]");
            if let Err(e) = self.store.delete_raw_session(&uuid).await {
                error!(uuid = %uuid, "Failed to delete abandoned session: {}", e);
            }
            self.boundary.reset();
            return AssemblyOutcome::Abandoned { uuid };
        }

        AssemblyOutcome::Waiting { uuid }
    }

    async fn complete_session(&mut self, uuid: String) -> AssemblyOutcome {
        info!(uuid = %uuid, "Raw session complete");

        let mut session = match self.store.load_raw_session(&uuid).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                error!(uuid = %uuid, "Raw session vanished before it could be loaded");
                return AssemblyOutcome::LoadFailed { uuid };
            }
            Err(e) => {
                error!(uuid = %uuid, "Raw session failed to be loaded, session dropped: {}", e);
                if let Err(e) = self.store.delete_raw_session(&uuid).await {
                    error!(uuid = %uuid, "Failed to delete unreadable session: {}", e);
                }
                return AssemblyOutcome::LoadFailed { uuid };
            }
        };

        if let Err(e) = self.store.delete_raw_session(&uuid).await {
            warn!(uuid = %uuid, "Failed to delete completed session: {}", e);
        }

        let verdict = self.integrity.mark_missing_samples(&session.samples);
        if !verdict.accepted {
            warn!(
                uuid = %uuid,
                missing = verdict.missing,
                "Raw session discarded, threshold not satisfied"
            );
            return AssemblyOutcome::Discarded {
                uuid,
                missing: verdict.missing,
            };
        }
        session.time_series = verdict.time_series;

        match send_json(self.outbound.as_ref(), &self.routes.preparation_url, &session).await {
            Ok(()) => info!(uuid = %uuid, "Raw session sent to the preparation stage"),
            Err(e) => error!(uuid = %uuid, "Failed to send raw session to preparation: {}", e),
        }

        let mut labelled = false;
        if self.window.is_evaluation() {
            match session.pressure_detected.clone() {
                Some(label) => {
                    let payload = LabelPayload {
                        uuid: uuid.clone(),
                        label,
                    };
                    match send_json(self.outbound.as_ref(), &self.routes.evaluation_url, &payload)
                        .await
                    {
                        Ok(()) => info!(uuid = %uuid, "Label sent to the evaluation stage"),
                        Err(e) => error!(uuid = %uuid, "Failed to send label to evaluation: {}", e),
                    }
                    labelled = true;
                }
                None => warn!(uuid = %uuid, "Evaluation mode session has no label record"),
            }
        }

        let switched_to = self.window.record_session();
        match switched_to {
            Some(Mode::Evaluation) => info!("Entering evaluation phase"),
            Some(Mode::Production) => info!("Evaluation phase ended"),
            None => debug!(
                to_evaluation = self.window.sessions_to_evaluation(),
                to_produce = self.window.sessions_to_produce(),
                "Window counters"
            ),
        }

        AssemblyOutcome::Forwarded {
            uuid,
            labelled,
            switched_to,
        }
    }
}
