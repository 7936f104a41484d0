//! # Web Inference Protocols
//!
//! Core data model and protocol definitions (traits) for the web inference pipeline.
//! Contains the types shared by every crate and the interfaces that backends implement.
//!
//! ## Core Traits
//!
//! - [`Classifier`] - Trait for LLM-backed section classifiers
//! - [`KnowledgeStore`] - Trait for inference and pattern persistence

pub mod classifier;
pub mod error;
pub mod store;
pub mod types;

// Re-export core traits
pub use classifier::{
    Classification, ClassificationContext, ClassificationRequest, Classifier,
};
pub use error::{ClassificationError, StoreError};
pub use store::KnowledgeStore;
pub use types::*;
