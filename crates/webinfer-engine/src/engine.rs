//! The inference engine.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use webinfer_config::Config;
use webinfer_extractor::{DomSnapshot, SectionExtractor};
use webinfer_protocols::{
    Classification, ClassificationContext, ClassificationError, ClassificationRequest,
    Classifier, FailureCategory, Inference, KnowledgeStore, Section,
};

use crate::error::EngineError;
use crate::result::{AnalysisWarning, PageAnalysis, ScoredSection};
use crate::retry::RetryPolicy;
use crate::site::{explicit_site_key, site_key_for};
use crate::stats::{AnalysisStats, EngineCounters, EngineTotals, RetryEvent};

/// Engine thresholds and limits.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Pattern reuse needs an aggregate confidence strictly above this.
    pub reuse_confidence_threshold: f64,
    /// Pattern reuse needs strictly more samples than this.
    pub min_support: u64,
    /// Fresh inferences strictly above this feed the pattern table.
    pub confirmation_threshold: f64,
    /// Sections in flight per page; also the engine-wide classifier call limit.
    pub max_concurrency: usize,
    pub reverify_concurrency: usize,
    pub classifier_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        let inference = &config.inference;
        Self {
            reuse_confidence_threshold: inference.reuse_confidence_threshold,
            min_support: inference.min_support,
            confirmation_threshold: inference.confirmation_threshold,
            max_concurrency: inference.max_concurrency,
            reverify_concurrency: inference.reverify_concurrency,
            classifier_timeout: Duration::from_secs(config.classifier.timeout_secs),
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Per-call analysis options.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Explicit site key; derived from the snapshot URL when absent.
    pub site_key: Option<String>,
    /// Skip cache and pattern lookup and classify every section.
    pub force_fresh: bool,
}

/// Work done while resolving one section, merged into page stats.
#[derive(Debug, Default)]
struct Tally {
    classifier_calls: u64,
    store_writes: u64,
    pattern_updates: u64,
    retry_events: Vec<RetryEvent>,
    warnings: Vec<AnalysisWarning>,
}

impl Tally {
    fn store_warning(&mut self, section_id: &str, message: String) {
        self.warnings.push(AnalysisWarning::Store {
            section_id: section_id.to_string(),
            message,
        });
    }

    fn merge_into(self, stats: &mut AnalysisStats, page: &mut PageAnalysis) {
        stats.classifier_calls += self.classifier_calls;
        stats.store_writes += self.store_writes;
        stats.pattern_updates += self.pattern_updates;
        stats.retries += self.retry_events.len() as u64;
        page.retry_events.extend(self.retry_events);
        page.warnings.extend(self.warnings);
    }
}

/// A classification that never succeeded.
struct Failure {
    category: FailureCategory,
    attempts: u32,
}

/// Sections of one page plus what the classifier gets to see around each.
struct PageContext<'a> {
    site_key: &'a str,
    url: &'a str,
    title: Option<&'a str>,
    sections: &'a [Section],
    by_id: HashMap<&'a str, usize>,
}

impl<'a> PageContext<'a> {
    fn new(site_key: &'a str, url: &'a str, title: Option<&'a str>, sections: &'a [Section]) -> Self {
        let by_id = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        Self {
            site_key,
            url,
            title,
            sections,
            by_id,
        }
    }

    fn request_for(&self, index: usize) -> ClassificationRequest {
        let section = &self.sections[index];
        let parent = section
            .parent_id
            .as_deref()
            .and_then(|id| self.by_id.get(id))
            .map(|&i| self.sections[i].summary.clone());

        let mut neighbors = Vec::new();
        if let Some(prev) = index.checked_sub(1).and_then(|i| self.sections.get(i)) {
            neighbors.push(prev.summary.clone());
        }
        if let Some(next) = self.sections.get(index + 1) {
            neighbors.push(next.summary.clone());
        }

        let context = ClassificationContext {
            site_key: self.site_key.to_string(),
            url: Some(self.url.to_string()).filter(|u| !u.is_empty()),
            page_title: self.title.filter(|t| !t.is_empty()).map(str::to_string),
            parent,
            neighbors,
        };
        ClassificationRequest::new(section, context)
    }
}

/// Cache-first, pattern-aware section classifier.
///
/// One engine may serve many concurrent page analyses; classifier calls are
/// bounded engine-wide and each `(site_key, section_id)` is resolved by at
/// most one task at a time.
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn KnowledgeStore>,
    extractor: SectionExtractor,
    settings: EngineSettings,
    call_permits: Semaphore,
    in_flight: DashMap<(String, String), Arc<Mutex<()>>>,
    counters: EngineCounters,
}

impl InferenceEngine {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn KnowledgeStore>,
        settings: EngineSettings,
    ) -> Self {
        let permits = settings.max_concurrency.max(1);
        Self {
            classifier,
            store,
            extractor: SectionExtractor::default(),
            settings,
            call_permits: Semaphore::new(permits),
            in_flight: DashMap::new(),
            counters: EngineCounters::default(),
        }
    }

    /// Build an engine with every setting taken from `config`.
    pub fn from_config(
        config: &Config,
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self::new(classifier, store, EngineSettings::from_config(config))
            .with_extractor(SectionExtractor::new(config.extraction.clone()))
    }

    pub fn with_extractor(mut self, extractor: SectionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    /// Cumulative counters across every analysis run by this engine.
    pub fn totals(&self) -> EngineTotals {
        self.counters.snapshot()
    }

    /// Extract and analyse one page snapshot.
    pub async fn analyze(
        &self,
        snapshot: &DomSnapshot,
        options: &AnalyzeOptions,
        cancel: &CancellationToken,
    ) -> Result<PageAnalysis, EngineError> {
        let site_key = match &options.site_key {
            Some(key) => explicit_site_key(key)?,
            None => site_key_for(&snapshot.url)?,
        };

        let extraction = self.extractor.extract(snapshot);
        let mut analysis = self
            .analyze_sections(
                &site_key,
                &snapshot.url,
                Some(snapshot.title.as_str()),
                extraction.sections,
                options.force_fresh,
                cancel,
            )
            .await;

        let mut warnings: Vec<AnalysisWarning> = extraction
            .warnings
            .into_iter()
            .map(AnalysisWarning::Extraction)
            .collect();
        warnings.append(&mut analysis.warnings);
        analysis.warnings = warnings;
        Ok(analysis)
    }

    /// Analyse already-extracted sections. Never fails: per-section problems
    /// become degraded inferences or warnings.
    pub async fn analyze_sections(
        &self,
        site_key: &str,
        url: &str,
        title: Option<&str>,
        sections: Vec<Section>,
        force_fresh: bool,
        cancel: &CancellationToken,
    ) -> PageAnalysis {
        let started = Instant::now();
        let page = PageContext::new(site_key, url, title, &sections);

        // Duplicate ids share the inference of their first occurrence.
        let mut seen = HashSet::new();
        let unique: Vec<usize> = (0..sections.len())
            .filter(|&i| seen.insert(sections[i].id.as_str()))
            .collect();

        let resolved: Vec<(Inference, Tally)> = stream::iter(unique)
            .map(|index| self.resolve(&page, index, force_fresh, cancel))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;
        drop(page);

        let mut analysis = PageAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            site_key: site_key.to_string(),
            url: url.to_string(),
            title: title.map(str::to_string),
            items: Vec::with_capacity(sections.len()),
            warnings: Vec::new(),
            retry_events: Vec::new(),
            stats: AnalysisStats::default(),
            cancelled: false,
        };

        let mut stats = AnalysisStats {
            sections: sections.len() as u64,
            ..Default::default()
        };
        let mut by_id = HashMap::with_capacity(resolved.len());
        for (inference, tally) in resolved {
            tally.merge_into(&mut stats, &mut analysis);
            stats.record_source(inference.source);
            by_id.insert(inference.section_id.clone(), inference);
        }

        for section in sections {
            let Some(inference) = by_id.get(&section.id).cloned() else {
                continue;
            };
            analysis.items.push(ScoredSection { section, inference });
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        self.counters.add_page(&stats);
        analysis.stats = stats;
        analysis.cancelled = cancel.is_cancelled();

        info!(
            "Analyzed {} ({}): {} sections, {} cache hits, {} pattern reuses, {} fresh, {} degraded, {} calls, {} retries in {}ms{}",
            analysis.site_key,
            analysis.analysis_id,
            analysis.stats.sections,
            analysis.stats.cache_hits,
            analysis.stats.pattern_reuses,
            analysis.stats.fresh_calls,
            analysis.stats.degraded,
            analysis.stats.classifier_calls,
            analysis.stats.retries,
            analysis.stats.duration_ms,
            if analysis.cancelled { " (cancelled)" } else { "" }
        );
        analysis
    }

    /// Classify provisional (pattern-reused) sections fresh to confirm or
    /// correct them. Runs with the smaller re-verification limit and leaves
    /// the provisional inference in place when classification fails.
    pub async fn reverify(
        &self,
        analysis: &mut PageAnalysis,
        cancel: &CancellationToken,
    ) -> AnalysisStats {
        let started = Instant::now();
        let sections: Vec<Section> = analysis.items.iter().map(|i| i.section.clone()).collect();
        // One call per provisional section id; duplicates take the result.
        let mut seen = HashSet::new();
        let targets: Vec<usize> = analysis
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.inference.provisional)
            .filter(|(_, item)| seen.insert(item.section.id.as_str()))
            .map(|(i, _)| i)
            .collect();
        let targeted = targets.len();

        let site_key = analysis.site_key.clone();
        let url = analysis.url.clone();
        let title = analysis.title.clone();
        let page = PageContext::new(&site_key, &url, title.as_deref(), &sections);

        let resolved: Vec<(usize, Option<Inference>, Tally)> = stream::iter(targets)
            .map(|index| {
                let page = &page;
                async move {
                    let section = &page.sections[index];
                    let mut tally = Tally::default();
                    let confirmed = self
                        .with_section_lock(page.site_key, &section.id, cancel, || {
                            self.classify_and_store(page, index, cancel, &mut tally)
                        })
                        .await
                        .and_then(Result::ok);
                    (index, confirmed, tally)
                }
            })
            .buffered(self.settings.reverify_concurrency.max(1))
            .collect()
            .await;

        let mut stats = AnalysisStats::default();
        for (index, confirmed, tally) in resolved {
            tally.merge_into(&mut stats, analysis);
            if let Some(inference) = confirmed {
                let previous = &analysis.items[index].inference;
                if previous.label != inference.label {
                    info!(
                        "Re-verification corrected section {}: '{}' -> '{}'",
                        inference.section_id, previous.label, inference.label
                    );
                }
                stats.record_source(inference.source);
                for item in analysis
                    .items
                    .iter_mut()
                    .filter(|item| item.section.id == inference.section_id)
                {
                    item.inference = inference.clone();
                }
            }
        }
        stats.duration_ms = started.elapsed().as_millis() as u64;

        self.counters.add(&stats);
        let page_stats = &mut analysis.stats;
        page_stats.classifier_calls += stats.classifier_calls;
        page_stats.store_writes += stats.store_writes;
        page_stats.pattern_updates += stats.pattern_updates;
        page_stats.retries += stats.retries;
        analysis.cancelled |= cancel.is_cancelled();

        debug!(
            "Re-verified {} provisional sections on {}: {} confirmed by fresh calls",
            targeted,
            analysis.site_key,
            stats.fresh_calls
        );
        stats
    }

    /// Run `work` while holding the single-flight lock for one section key.
    /// Returns `None` when cancelled while waiting for the lock.
    async fn with_section_lock<F, Fut, T>(
        &self,
        site_key: &str,
        section_id: &str,
        cancel: &CancellationToken,
        work: F,
    ) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let key = (site_key.to_string(), section_id.to_string());
        let lock = self.in_flight.entry(key.clone()).or_default().clone();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            _guard = lock.lock() => Some(work().await),
        };

        drop(lock);
        self.in_flight
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn resolve(
        &self,
        page: &PageContext<'_>,
        index: usize,
        force_fresh: bool,
        cancel: &CancellationToken,
    ) -> (Inference, Tally) {
        let section = &page.sections[index];
        let mut tally = Tally::default();

        if cancel.is_cancelled() {
            return (
                Inference::degraded(section, FailureCategory::Cancelled, 0),
                tally,
            );
        }

        let inference = self
            .with_section_lock(page.site_key, &section.id, cancel, || {
                self.resolve_locked(page, index, force_fresh, cancel, &mut tally)
            })
            .await
            .unwrap_or_else(|| Inference::degraded(section, FailureCategory::Cancelled, 0));
        (inference, tally)
    }

    async fn resolve_locked(
        &self,
        page: &PageContext<'_>,
        index: usize,
        force_fresh: bool,
        cancel: &CancellationToken,
        tally: &mut Tally,
    ) -> Inference {
        let section = &page.sections[index];

        if !force_fresh {
            if let Some(cached) = self.cached(page.site_key, section, tally).await {
                debug!(
                    "Section {} served from cache as '{}' ({:.2})",
                    section.id, cached.label, cached.confidence
                );
                return cached;
            }

            if let Some(reused) = self.from_pattern(page.site_key, section, tally).await {
                return reused;
            }
        }

        match self.classify_and_store(page, index, cancel, tally).await {
            Ok(inference) => inference,
            Err(failure) => {
                if failure.category != FailureCategory::Cancelled {
                    warn!(
                        "Section {} degraded after {} attempt(s): {}",
                        section.id, failure.attempts, failure.category
                    );
                }
                Inference::degraded(section, failure.category, failure.attempts)
            }
        }
    }

    /// Current stored inference for an unchanged section. Lookup failures
    /// count as misses.
    async fn cached(&self, site_key: &str, section: &Section, tally: &mut Tally) -> Option<Inference> {
        match self.store.get_current(site_key, &section.id).await {
            Ok(Some(stored))
                if stored.content_hash == section.content_hash && !stored.is_degraded() =>
            {
                Some(stored.into_cache_hit())
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Store lookup failed for section {}: {}", section.id, e);
                tally.store_warning(&section.id, format!("lookup failed: {}", e));
                None
            }
        }
    }

    /// Provisional inference from a cross-site pattern that clears both
    /// reuse thresholds. Persisted as current, never folded back into the
    /// pattern.
    async fn from_pattern(
        &self,
        site_key: &str,
        section: &Section,
        tally: &mut Tally,
    ) -> Option<Inference> {
        let pattern = match self.store.get_pattern(&section.structural_signature).await {
            Ok(pattern) => pattern?,
            Err(e) => {
                warn!(
                    "Pattern lookup failed for signature {}: {}",
                    section.structural_signature, e
                );
                tally.store_warning(&section.id, format!("pattern lookup failed: {}", e));
                return None;
            }
        };

        let dominant = pattern.reusable(
            self.settings.reuse_confidence_threshold,
            self.settings.min_support,
        )?;
        let inference = Inference::from_pattern(section, &dominant);
        debug!(
            "Section {} reuses pattern '{}' ({:.2} over {} samples)",
            section.id, dominant.label, dominant.aggregate_confidence, dominant.sample_count
        );
        self.persist(site_key, &inference, tally).await;
        Some(inference)
    }

    /// Classify one section fresh, write it back and feed the pattern table.
    async fn classify_and_store(
        &self,
        page: &PageContext<'_>,
        index: usize,
        cancel: &CancellationToken,
        tally: &mut Tally,
    ) -> Result<Inference, Failure> {
        let section = &page.sections[index];
        let request = page.request_for(index);
        let classification = self
            .classify_with_retry(section, &request, cancel, tally)
            .await?;

        let inference = Inference::fresh(section, classification);
        debug!(
            "Section {} classified as '{}' ({:.2})",
            section.id, inference.label, inference.confidence
        );
        self.persist(page.site_key, &inference, tally).await;

        if inference.confidence > self.settings.confirmation_threshold {
            match self
                .store
                .update_pattern(
                    &inference.structural_signature,
                    &inference.label,
                    inference.confidence,
                    Utc::now(),
                )
                .await
            {
                Ok(pattern) => {
                    tally.pattern_updates += 1;
                    debug!(
                        "Pattern {} now has {} samples",
                        pattern.structural_signature,
                        pattern.sample_count()
                    );
                }
                Err(e) => {
                    warn!(
                        "Pattern update failed for signature {}: {}",
                        inference.structural_signature, e
                    );
                    tally.store_warning(&section.id, format!("pattern update failed: {}", e));
                }
            }
        }

        Ok(inference)
    }

    async fn persist(&self, site_key: &str, inference: &Inference, tally: &mut Tally) {
        match self.store.upsert(site_key, inference.clone()).await {
            Ok(()) => tally.store_writes += 1,
            Err(e) => {
                warn!("Store write failed for section {}: {}", inference.section_id, e);
                tally.store_warning(&inference.section_id, format!("write failed: {}", e));
            }
        }
    }

    /// Call the classifier with bounded retries. Cancellation stops new
    /// attempts and abandons an attempt in flight.
    async fn classify_with_retry(
        &self,
        section: &Section,
        request: &ClassificationRequest,
        cancel: &CancellationToken,
        tally: &mut Tally,
    ) -> Result<Classification, Failure> {
        let policy = &self.settings.retry;
        let timeout = self.settings.classifier_timeout;
        let cancelled = |attempts| Failure {
            category: FailureCategory::Cancelled,
            attempts,
        };
        let mut attempts = 0;

        loop {
            let result = {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(attempts)),
                    permit = self.call_permits.acquire() => permit,
                };
                let Ok(_permit) = permit else {
                    return Err(Failure {
                        category: FailureCategory::ProviderUnavailable,
                        attempts,
                    });
                };

                attempts += 1;
                tally.classifier_calls += 1;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(cancelled(attempts)),
                    result = tokio::time::timeout(timeout, self.classifier.classify(request)) => {
                        result.unwrap_or_else(|_| Err(ClassificationError::Timeout(timeout)))
                    }
                }
            };

            let error = match result {
                Ok(classification) => return Ok(classification),
                Err(error) => error,
            };

            if !error.is_retryable() || attempts >= policy.max_attempts() {
                return Err(Failure {
                    category: error.category(),
                    attempts,
                });
            }

            let delay = policy.delay_after(&error, attempts - 1);
            warn!(
                "Classifier error for section {} (attempt {}/{}): {}, retrying in {:?}",
                section.id,
                attempts,
                policy.max_attempts(),
                error,
                delay
            );
            tally.retry_events.push(RetryEvent {
                section_id: section.id.clone(),
                attempt: attempts,
                category: error.category(),
                message: error.to_string(),
                delay_ms: delay.as_millis() as u64,
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(attempts)),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
