//! Evaluation window: production/evaluation sampling state machine
//!
//! Sessions are normally run in production mode. After `production_window`
//! completed sessions the ingestion stage switches to evaluation mode, where
//! each completed session also emits its expert label to the evaluation
//! stage. After `evaluation_window` such sessions it switches back.
//! Only the counter belonging to the current mode ever moves.
//!
//! A development window never enters evaluation mode on its own: a stage
//! started in evaluation mode labels one evaluation window, then stays in
//! production mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling mode of the ingestion stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Production,
    Evaluation,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Production => f.write_str("production"),
            Mode::Evaluation => f.write_str("evaluation"),
        }
    }
}

/// Rolling counters deciding when to switch modes
#[derive(Debug, Clone)]
pub struct EvaluationWindow {
    mode: Mode,
    sessions_to_evaluation: u32,
    sessions_to_produce: u32,
    evaluation_window: u32,
    production_window: u32,
    cycling: bool,
}

impl EvaluationWindow {
    pub fn new(initial_mode: Mode, evaluation_window: u32, production_window: u32) -> Self {
        Self {
            mode: initial_mode,
            sessions_to_evaluation: 0,
            sessions_to_produce: 0,
            evaluation_window,
            production_window,
            cycling: true,
        }
    }

    /// One-way window for the development operative mode
    pub fn development(initial_mode: Mode, evaluation_window: u32) -> Self {
        Self {
            cycling: false,
            ..Self::new(initial_mode, evaluation_window, 0)
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_evaluation(&self) -> bool {
        self.mode == Mode::Evaluation
    }

    pub fn sessions_to_evaluation(&self) -> u32 {
        self.sessions_to_evaluation
    }

    pub fn sessions_to_produce(&self) -> u32 {
        self.sessions_to_produce
    }

    /// Count one completed (forwarded) session.
    ///
    /// Returns the new mode when this session closed the current window.
    pub fn record_session(&mut self) -> Option<Mode> {
        match self.mode {
            Mode::Evaluation => {
                self.sessions_to_evaluation += 1;
                if self.sessions_to_evaluation >= self.evaluation_window {
                    self.sessions_to_evaluation = 0;
                    self.mode = Mode::Production;
                    return Some(Mode::Production);
                }
            }
            Mode::Production if !self.cycling => {}
            Mode::Production => {
                self.sessions_to_produce += 1;
                if self.sessions_to_produce >= self.production_window {
                    self.sessions_to_produce = 0;
                    self.mode = Mode::Evaluation;
                    return Some(Mode::Evaluation);
                }
            }
        }
        None
    }
}
