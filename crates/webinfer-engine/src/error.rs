//! Engine errors.
//!
//! Per-section failures never surface here; they become degraded inferences.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot derive a site key from '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Site key must not be empty")]
    EmptySiteKey,
}
