//! Shared HTTP API pieces
//!
//! Every PMON service validates payloads at the boundary with the same
//! extractor and reports failures with the same JSON error body:
//!
//! ```json
//! {"error": {"code": "BAD_REQUEST", "message": "..."}}
//! ```

pub mod error;
pub mod types;

pub use error::{ApiError, ApiResult, ValidJson};
pub use types::{Ack, HealthResponse};
