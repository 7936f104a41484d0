//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Provider names a classifier can be built for.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "anthropic", "ollama", "groq", "heuristic"];

/// Upper bound for `extraction.max_depth`; DOM trees are walked recursively.
pub const MAX_EXTRACTION_DEPTH: usize = 512;

const KNOWN_BACKENDS: &[&str] = &["sqlite", "memory"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], for callers that refuse invalid config.
    pub fn into_error(self) -> Option<ConfigError> {
        self.errors.into_iter().next().map(|e| ConfigError::InvalidValue {
            field: e.path,
            message: e.message,
        })
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_classifier(config, &mut result);
        Self::validate_providers(config, &mut result);
        Self::validate_retry(config, &mut result);
        Self::validate_inference(config, &mut result);
        Self::validate_extraction(config, &mut result);
        Self::validate_store(config, &mut result);
        Self::validate_overlay(config, &mut result);

        Ok(result)
    }

    fn validate_classifier(config: &Config, result: &mut ValidationResult) {
        let provider = config.classifier.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            result.add_error(ValidationError::new(
                "classifier.provider",
                format!(
                    "Unknown provider '{}', valid values: {:?}",
                    provider, KNOWN_PROVIDERS
                ),
            ));
        }

        if config.classifier.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "classifier.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if config.classifier.max_tokens == 0 {
            result.add_error(ValidationError::new(
                "classifier.max_tokens",
                "max_tokens must be greater than 0",
            ));
        }

        if !(0.0..=2.0).contains(&config.classifier.temperature) {
            result.add_warning(ValidationWarning::new(
                "classifier.temperature",
                "temperature outside [0, 2] is rejected by most providers",
            ));
        }
    }

    fn validate_providers(config: &Config, result: &mut ValidationResult) {
        for (name, provider) in &config.providers {
            if let Some(ref url) = provider.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    result.add_error(ValidationError::new(
                        format!("providers.{}.base_url", name),
                        "base_url must start with http:// or https://",
                    ));
                }
            }
        }

        let active = config.classifier.provider.as_str();
        let needs_key = matches!(active, "openai" | "anthropic" | "groq");
        let has_key = config
            .active_provider()
            .is_some_and(|p| p.api_key.is_some());
        if needs_key && !has_key {
            result.add_warning(ValidationWarning::new(
                format!("providers.{}.api_key", active),
                "API key is not set, may need to be set via environment variable",
            ));
        }
    }

    fn validate_retry(config: &Config, result: &mut ValidationResult) {
        let retry = &config.retry;
        if retry.backoff_multiplier < 1.0 {
            result.add_error(ValidationError::new(
                "retry.backoff_multiplier",
                "backoff_multiplier must be at least 1.0",
            ));
        }

        if retry.base_delay_ms > retry.max_delay_ms {
            result.add_error(ValidationError::new(
                "retry.base_delay_ms",
                "base_delay_ms cannot exceed max_delay_ms",
            ));
        }

        if retry.max_retries > 10 {
            result.add_warning(ValidationWarning::new(
                "retry.max_retries",
                "max_retries is very high (>10), failing sections may stall a page",
            ));
        }
    }

    fn validate_inference(config: &Config, result: &mut ValidationResult) {
        let inference = &config.inference;
        for (path, value) in [
            (
                "inference.reuse_confidence_threshold",
                inference.reuse_confidence_threshold,
            ),
            (
                "inference.confirmation_threshold",
                inference.confirmation_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                result.add_error(ValidationError::new(path, "must be within [0, 1]"));
            }
        }

        if inference.max_concurrency == 0 {
            result.add_error(ValidationError::new(
                "inference.max_concurrency",
                "max_concurrency must be greater than 0",
            ));
        }

        if inference.reverify_concurrency == 0 {
            result.add_error(ValidationError::new(
                "inference.reverify_concurrency",
                "reverify_concurrency must be greater than 0",
            ));
        }

        if inference.confirmation_threshold > inference.reuse_confidence_threshold {
            result.add_warning(ValidationWarning::new(
                "inference.confirmation_threshold",
                "confirmation_threshold above reuse_confidence_threshold lets few patterns form",
            ));
        }
    }

    fn validate_extraction(config: &Config, result: &mut ValidationResult) {
        let extraction = &config.extraction;
        if extraction.min_element_size < 0.0 {
            result.add_error(ValidationError::new(
                "extraction.min_element_size",
                "min_element_size cannot be negative",
            ));
        }

        if extraction.max_sections == 0 {
            result.add_error(ValidationError::new(
                "extraction.max_sections",
                "max_sections must be greater than 0",
            ));
        }

        if extraction.max_depth == 0 {
            result.add_error(ValidationError::new(
                "extraction.max_depth",
                "max_depth must be greater than 0",
            ));
        } else if extraction.max_depth > MAX_EXTRACTION_DEPTH {
            result.add_error(ValidationError::new(
                "extraction.max_depth",
                format!("max_depth must not exceed {}", MAX_EXTRACTION_DEPTH),
            ));
        }

        if extraction.max_text_chars < 50 {
            result.add_warning(ValidationWarning::new(
                "extraction.max_text_chars",
                "max_text_chars below 50 leaves the classifier very little to work with",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        if !KNOWN_BACKENDS.contains(&config.store.backend.as_str()) {
            result.add_error(ValidationError::new(
                "store.backend",
                format!(
                    "Unknown store backend '{}', valid values: {:?}",
                    config.store.backend, KNOWN_BACKENDS
                ),
            ));
        }

        if config.store.backend == "sqlite" && config.store.path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "store.path",
                "SQLite backend requires a path",
            ));
        }

        if config.store.backend == "memory" {
            result.add_warning(ValidationWarning::new(
                "store.backend",
                "memory backend forgets all inferences when the process exits",
            ));
        }
    }

    fn validate_overlay(config: &Config, result: &mut ValidationResult) {
        let overlay = &config.overlay;
        if overlay.medium_confidence > overlay.high_confidence {
            result.add_error(ValidationError::new(
                "overlay.medium_confidence",
                "medium_confidence cannot exceed high_confidence",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
