//! Backoff policy for classifier retries.

use std::time::Duration;

use webinfer_config::RetrySettings;
use webinfer_protocols::ClassificationError;

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Add jitter to delays.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
            jitter: settings.jitter,
        }
    }
}

impl RetryPolicy {
    /// Policy without delays, for tests and offline classifiers.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate delay for a given zero-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let delay = delay.min(self.max_delay.as_millis() as f64);

        let delay_ms = if self.jitter {
            let jitter = rand_jitter(delay * 0.1);
            (delay + jitter).max(0.0) as u64
        } else {
            delay as u64
        };

        Duration::from_millis(delay_ms)
    }

    /// Delay before retrying after `error`. A provider-supplied
    /// `retry-after` wins over backoff but is still capped at `max_delay`.
    pub fn delay_after(&self, error: &ClassificationError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(requested) => requested.min(self.max_delay),
            None => self.delay_for_attempt(attempt),
        }
    }
}

/// Simple jitter using system time.
fn rand_jitter(max: f64) -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64 / u32::MAX as f64) * max * 2.0 - max
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
