//! Per-page statistics and cumulative engine counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use webinfer_protocols::{FailureCategory, InferenceSource};

/// One failed attempt that was followed by another attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryEvent {
    pub section_id: String,
    /// One-based number of the failed attempt.
    pub attempt: u32,
    pub category: FailureCategory,
    pub message: String,
    pub delay_ms: u64,
}

/// Counts for one page analysis.
///
/// `sections` counts extracted items; the per-source counters count
/// distinct section ids, so a duplicated section is one fresh call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub sections: u64,
    /// Classifier invocations, including retried attempts.
    pub classifier_calls: u64,
    pub cache_hits: u64,
    pub pattern_reuses: u64,
    pub fresh_calls: u64,
    pub degraded: u64,
    pub retries: u64,
    pub store_writes: u64,
    pub pattern_updates: u64,
    pub duration_ms: u64,
}

impl AnalysisStats {
    pub(crate) fn record_source(&mut self, source: InferenceSource) {
        match source {
            InferenceSource::CacheHit => self.cache_hits += 1,
            InferenceSource::FreshCall => self.fresh_calls += 1,
            InferenceSource::PatternReused => self.pattern_reuses += 1,
            InferenceSource::Degraded => self.degraded += 1,
        }
    }
}

/// Cumulative counters across every analysis run by one engine.
#[derive(Debug, Default)]
pub struct EngineCounters {
    pages: AtomicU64,
    classifier_calls: AtomicU64,
    cache_hits: AtomicU64,
    pattern_reuses: AtomicU64,
    fresh_calls: AtomicU64,
    degraded: AtomicU64,
    retries: AtomicU64,
    store_writes: AtomicU64,
    pattern_updates: AtomicU64,
}

/// Point-in-time copy of [`EngineCounters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineTotals {
    pub pages: u64,
    pub classifier_calls: u64,
    pub cache_hits: u64,
    pub pattern_reuses: u64,
    pub fresh_calls: u64,
    pub degraded: u64,
    pub retries: u64,
    pub store_writes: u64,
    pub pattern_updates: u64,
}

impl EngineCounters {
    pub(crate) fn add_page(&self, stats: &AnalysisStats) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.add(stats);
    }

    pub(crate) fn add(&self, stats: &AnalysisStats) {
        self.classifier_calls
            .fetch_add(stats.classifier_calls, Ordering::Relaxed);
        self.cache_hits.fetch_add(stats.cache_hits, Ordering::Relaxed);
        self.pattern_reuses
            .fetch_add(stats.pattern_reuses, Ordering::Relaxed);
        self.fresh_calls.fetch_add(stats.fresh_calls, Ordering::Relaxed);
        self.degraded.fetch_add(stats.degraded, Ordering::Relaxed);
        self.retries.fetch_add(stats.retries, Ordering::Relaxed);
        self.store_writes
            .fetch_add(stats.store_writes, Ordering::Relaxed);
        self.pattern_updates
            .fetch_add(stats.pattern_updates, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineTotals {
        EngineTotals {
            pages: self.pages.load(Ordering::Relaxed),
            classifier_calls: self.classifier_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            pattern_reuses: self.pattern_reuses.load(Ordering::Relaxed),
            fresh_calls: self.fresh_calls.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            store_writes: self.store_writes.load(Ordering::Relaxed),
            pattern_updates: self.pattern_updates.load(Ordering::Relaxed),
        }
    }
}
