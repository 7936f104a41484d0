//! Storage, presentation and logging configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Knowledge store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `sqlite` or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// SQLite database file. `~` is expanded.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

fn default_backend() -> String {
    "sqlite".to_string()
}

fn default_store_path() -> String {
    "~/.webinfer/knowledge.db".to_string()
}

/// Confidence band thresholds for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,

    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
        }
    }
}

fn default_high_confidence() -> f64 {
    0.8
}

fn default_medium_confidence() -> f64 {
    0.5
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit console logs as JSON.
    #[serde(default)]
    pub json: bool,

    /// Directory for daily-rolling log files. Disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
