//! Knowledge store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// Conflicts resolve themselves once the competing writer commits.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
