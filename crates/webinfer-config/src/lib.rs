//! # webinfer Config
//!
//! Configuration management for the web inference pipeline.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{
    ConfigValidator, MAX_EXTRACTION_DEPTH, ValidationError, ValidationResult, ValidationWarning,
};
