//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

mod schema_infra;
mod schema_pipeline;

pub use schema_infra::*;
pub use schema_pipeline::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Settings for the configured classifier provider, if any were given.
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.classifier.provider)
    }
}

/// Classifier selection and call parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// One of `openai`, `anthropic`, `ollama`, `groq`, `heuristic`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Hard timeout for a single classifier call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    400
}

fn default_temperature() -> f32 {
    0.3
}

/// Provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
