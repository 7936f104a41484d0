//! Pipeline tuning: retries, inference thresholds and extraction limits.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Classifier retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Inference engine thresholds and concurrency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// A pattern is reused only when its aggregate confidence exceeds this.
    #[serde(default = "default_reuse_confidence_threshold")]
    pub reuse_confidence_threshold: f64,

    /// A pattern is reused only when its dominant label has more samples than this.
    #[serde(default = "default_min_support")]
    pub min_support: u64,

    /// Fresh inferences above this confidence feed the pattern table.
    #[serde(default = "default_confirmation_threshold")]
    pub confirmation_threshold: f64,

    /// Sections processed concurrently within one page.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Concurrent classifier calls during a re-verification pass.
    #[serde(default = "default_reverify_concurrency")]
    pub reverify_concurrency: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            reuse_confidence_threshold: default_reuse_confidence_threshold(),
            min_support: default_min_support(),
            confirmation_threshold: default_confirmation_threshold(),
            max_concurrency: default_max_concurrency(),
            reverify_concurrency: default_reverify_concurrency(),
        }
    }
}

fn default_reuse_confidence_threshold() -> f64 {
    0.85
}

fn default_min_support() -> u64 {
    5
}

fn default_confirmation_threshold() -> f64 {
    0.6
}

fn default_max_concurrency() -> usize {
    4
}

fn default_reverify_concurrency() -> usize {
    1
}

/// Section extraction limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum width and height, in pixels, of a section with known geometry.
    #[serde(default = "default_min_element_size")]
    pub min_element_size: f64,

    #[serde(default = "default_max_sections")]
    pub max_sections: usize,

    /// Visible text sent to classification is cut at this many characters.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_element_size: default_min_element_size(),
            max_sections: default_max_sections(),
            max_text_chars: default_max_text_chars(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_min_element_size() -> f64 {
    50.0
}

fn default_max_sections() -> usize {
    100
}

fn default_max_text_chars() -> usize {
    1000
}

fn default_max_depth() -> usize {
    256
}
