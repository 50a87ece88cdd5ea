//! # PMON Common Library
//!
//! Shared code for all PMON pipeline services including:
//! - Telemetry, session and label types
//! - Error type
//! - Configuration resolution and logging setup
//! - SQLite store helpers
//! - Single-consumer work queue
//! - Outbound HTTP client
//! - API error/health types

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod outbound;
pub mod queue;

pub use error::{Error, Result};
pub use outbound::{HttpOutbound, Outbound};
pub use queue::{work_queue, QueueMessage, QueueReceiver, QueueSender};
