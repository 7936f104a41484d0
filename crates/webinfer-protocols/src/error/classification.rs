//! Classification errors.

use std::time::Duration;

use thiserror::Error;

use crate::types::FailureCategory;

#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Request rejected: {status} - {message}")]
    Rejected { status: u16, message: String },
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(": retry after {} seconds", d.as_secs()),
        None => String::new(),
    }
}

impl ClassificationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    /// Delay requested by the provider, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Timeout(_) => FailureCategory::Timeout,
            Self::RateLimited { .. } => FailureCategory::RateLimited,
            Self::MalformedResponse(_) => FailureCategory::MalformedResponse,
            Self::ProviderUnavailable(_) => FailureCategory::ProviderUnavailable,
            Self::Rejected { .. } => FailureCategory::Rejected,
        }
    }

    /// Map a non-success HTTP status from a provider API.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            408 | 504 => Self::Timeout(Duration::ZERO),
            500..=599 => Self::ProviderUnavailable(format!("{} - {}", status, body)),
            _ => Self::Rejected {
                status,
                message: body.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "classification_tests.rs"]
mod tests;
