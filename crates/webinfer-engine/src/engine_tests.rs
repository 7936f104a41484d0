use super::*;
use std::collections::VecDeque;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use chrono::DateTime;
use webinfer_extractor::DomNode;
use webinfer_protocols::{InferenceSource, Pattern, StoreError};
use webinfer_store_memory::MemoryKnowledgeStore;

struct MockClassifier {
    confidence: f64,
    delay: Duration,
    failures: StdMutex<VecDeque<ClassificationError>>,
    requests: StdMutex<Vec<ClassificationRequest>>,
}

impl MockClassifier {
    fn new() -> Self {
        Self {
            confidence: 0.9,
            delay: Duration::ZERO,
            failures: StdMutex::new(VecDeque::new()),
            requests: StdMutex::new(Vec::new()),
        }
    }

    fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_with(self, errors: impl IntoIterator<Item = ClassificationError>) -> Self {
        self.failures.lock().unwrap().extend(errors);
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request_for_tag(&self, tag: &str) -> ClassificationRequest {
        let prefix = format!("tag: {}\n", tag);
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.content.starts_with(&prefix))
            .cloned()
            .unwrap()
    }
}

fn label_for(content: &str) -> &'static str {
    match content.lines().next().unwrap_or_default() {
        "tag: nav" => "navigation",
        "tag: header" => "header",
        "tag: footer" => "footer",
        _ => "content",
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn id(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-1"
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let label = label_for(&request.content);
        Ok(Classification {
            label: label.to_string(),
            confidence: self.confidence,
            rationale: format!("Looks like {}", label),
        })
    }
}

/// Store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl KnowledgeStore for BrokenStore {
    fn id(&self) -> &str {
        "broken"
    }

    async fn get_current(&self, _: &str, _: &str) -> Result<Option<Inference>, StoreError> {
        Err(StoreError::ConnectionError("database unavailable".to_string()))
    }

    async fn upsert(&self, _: &str, _: Inference) -> Result<(), StoreError> {
        Err(StoreError::ConnectionError("database unavailable".to_string()))
    }

    async fn get_pattern(&self, _: &str) -> Result<Option<Pattern>, StoreError> {
        Err(StoreError::QueryError("no such table".to_string()))
    }

    async fn update_pattern(
        &self,
        _: &str,
        _: &str,
        _: f64,
        _: DateTime<Utc>,
    ) -> Result<Pattern, StoreError> {
        Err(StoreError::ConnectionError("database unavailable".to_string()))
    }

    async fn history(&self, _: &str, _: &str) -> Result<Vec<Inference>, StoreError> {
        Ok(Vec::new())
    }

    async fn site_inferences(&self, _: &str) -> Result<Vec<Inference>, StoreError> {
        Ok(Vec::new())
    }

    async fn clear_site(&self, _: &str) -> Result<usize, StoreError> {
        Ok(0)
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        retry: RetryPolicy::immediate(2),
        ..Default::default()
    }
}

fn engine_with(
    classifier: Arc<MockClassifier>,
    store: Arc<dyn KnowledgeStore>,
    settings: EngineSettings,
) -> InferenceEngine {
    InferenceEngine::new(classifier, store, settings)
}

fn nav(labels: &[&str]) -> DomNode {
    DomNode::new("nav").with_child(DomNode::new("ul").with_children(labels.iter().map(|l| {
        DomNode::new("li").with_child(DomNode::new("a").with_attr("href", "#").with_text(*l))
    })))
}

fn page(url: &str, children: Vec<DomNode>) -> DomSnapshot {
    DomSnapshot::new(
        url,
        DomNode::new("html").with_child(DomNode::new("body").with_children(children)),
    )
    .with_title("Example")
}

fn three_sections(url: &str) -> DomSnapshot {
    page(
        url,
        vec![
            DomNode::new("header").with_text("Example Inc"),
            nav(&["Home", "Pricing", "Docs"]),
            DomNode::new("footer").with_text("(c) 2024 Example Inc"),
        ],
    )
}

fn sources(analysis: &PageAnalysis) -> Vec<InferenceSource> {
    analysis.items.iter().map(|i| i.inference.source).collect()
}

#[tokio::test]
async fn test_fresh_then_cached() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let snapshot = three_sections("https://example.com/");
    let cancel = CancellationToken::new();

    let first = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(first.site_key, "example.com");
    assert_eq!(first.items.len(), 3);
    assert_eq!(sources(&first), vec![InferenceSource::FreshCall; 3]);
    assert_eq!(first.stats.classifier_calls, 3);
    assert_eq!(first.stats.store_writes, 3);
    assert_eq!(first.stats.cache_hits, 0);
    assert_eq!(first.stats.pattern_updates, 3);
    assert!(!first.cancelled);

    let second = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(classifier.calls(), 3);
    assert_eq!(sources(&second), vec![InferenceSource::CacheHit; 3]);
    assert_eq!(second.stats.cache_hits, 3);
    assert_eq!(second.stats.store_writes, 0);
    for (a, b) in first.items.iter().zip(&second.items) {
        assert_eq!(b.inference, a.inference.clone().into_cache_hit());
    }

    let totals = engine.totals();
    assert_eq!(totals.pages, 2);
    assert_eq!(totals.classifier_calls, 3);
    assert_eq!(totals.cache_hits, 3);
}

#[tokio::test]
async fn test_force_fresh_bypasses_cache() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let snapshot = three_sections("https://example.com/");
    let cancel = CancellationToken::new();

    engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &cancel)
        .await
        .unwrap();
    let options = AnalyzeOptions {
        force_fresh: true,
        ..Default::default()
    };
    let again = engine.analyze(&snapshot, &options, &cancel).await.unwrap();

    assert_eq!(classifier.calls(), 6);
    assert_eq!(sources(&again), vec![InferenceSource::FreshCall; 3]);
    let history = store
        .history("example.com", &again.items[0].section.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_stale_content_hash_reclassifies() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let cancel = CancellationToken::new();

    let extraction = SectionExtractor::default().extract(&three_sections("https://example.com/"));
    let mut sections = extraction.sections;
    sections.truncate(1);

    engine
        .analyze_sections("example.com", "", None, sections.clone(), false, &cancel)
        .await;

    sections[0].content_hash = "changed".to_string();
    let again = engine
        .analyze_sections("example.com", "", None, sections, false, &cancel)
        .await;

    assert_eq!(classifier.calls(), 2);
    assert_eq!(again.items[0].inference.source, InferenceSource::FreshCall);
    assert_eq!(again.items[0].inference.content_hash, "changed");
}

#[tokio::test]
async fn test_exhausted_retries_degrade_without_persisting() {
    let classifier = Arc::new(
        MockClassifier::new().failing_with(vec![
            ClassificationError::Timeout(Duration::from_secs(1));
            5
        ]),
    );
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let snapshot = page("https://example.com/", vec![nav(&["Home"])]);

    let analysis = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(analysis.items.len(), 1);
    let inference = &analysis.items[0].inference;
    assert_eq!(inference.source, InferenceSource::Degraded);
    assert_eq!(inference.label, "unknown");
    assert_eq!(inference.confidence, 0.0);
    assert_eq!(inference.failure, Some(FailureCategory::Timeout));
    assert!(inference.rationale.contains("timed out"));
    assert_eq!(classifier.calls(), 3);
    assert_eq!(analysis.retry_events.len(), 2);
    assert_eq!(analysis.stats.degraded, 1);
    assert_eq!(analysis.stats.store_writes, 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_rejected_is_not_retried() {
    let classifier = Arc::new(MockClassifier::new().failing_with([ClassificationError::Rejected {
        status: 401,
        message: "bad key".to_string(),
    }]));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store, settings());
    let snapshot = page("https://example.com/", vec![nav(&["Home"])]);

    let analysis = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(classifier.calls(), 1);
    assert!(analysis.retry_events.is_empty());
    assert_eq!(
        analysis.items[0].inference.failure,
        Some(FailureCategory::Rejected)
    );
}

#[tokio::test]
async fn test_malformed_then_success() {
    let classifier = Arc::new(MockClassifier::new().failing_with([
        ClassificationError::MalformedResponse("missing label".to_string()),
    ]));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store, settings());
    let snapshot = page("https://example.com/", vec![nav(&["Home"])]);

    let analysis = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(analysis.items[0].inference.source, InferenceSource::FreshCall);
    assert_eq!(analysis.retry_events.len(), 1);
    assert_eq!(
        analysis.retry_events[0].category,
        FailureCategory::MalformedResponse
    );
    assert_eq!(analysis.retry_events[0].attempt, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_is_honoured() {
    let classifier = Arc::new(MockClassifier::new().failing_with([
        ClassificationError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        },
    ]));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(
        classifier.clone(),
        store,
        EngineSettings {
            retry: RetryPolicy {
                jitter: false,
                ..RetryPolicy::default()
            },
            ..Default::default()
        },
    );
    let snapshot = page("https://example.com/", vec![nav(&["Home"])]);

    let started = tokio::time::Instant::now();
    let analysis = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(analysis.items[0].inference.source, InferenceSource::FreshCall);
    assert_eq!(analysis.retry_events[0].delay_ms, 2000);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_slow_classifier_times_out() {
    let classifier = Arc::new(MockClassifier::new().with_delay(Duration::from_secs(60)));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(
        classifier.clone(),
        store,
        EngineSettings {
            classifier_timeout: Duration::from_secs(1),
            retry: RetryPolicy::immediate(1),
            ..Default::default()
        },
    );
    let snapshot = page("https://example.com/", vec![nav(&["Home"])]);

    let analysis = engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(classifier.calls(), 2);
    assert_eq!(analysis.retry_events.len(), 1);
    assert_eq!(analysis.retry_events[0].category, FailureCategory::Timeout);
    assert_eq!(
        analysis.items[0].inference.failure,
        Some(FailureCategory::Timeout)
    );
}

#[tokio::test]
async fn test_duplicate_section_ids_classified_once() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store, settings());

    let extraction =
        SectionExtractor::default().extract(&page("https://example.com/", vec![nav(&["Home"])]));
    let section = extraction.sections[0].clone();
    let analysis = engine
        .analyze_sections(
            "example.com",
            "https://example.com/",
            None,
            vec![section.clone(), section],
            false,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(classifier.calls(), 1);
    assert_eq!(analysis.items.len(), 2);
    assert_eq!(analysis.items[0].inference, analysis.items[1].inference);
    assert_eq!(analysis.stats.sections, 2);
    assert_eq!(analysis.stats.classifier_calls, 1);
    assert_eq!(analysis.stats.fresh_calls, 1);
    assert_eq!(analysis.stats.cache_hits, 0);
    assert_eq!(analysis.stats.store_writes, 1);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let analysis = engine
        .analyze(
            &three_sections("https://example.com/"),
            &AnalyzeOptions::default(),
            &cancel,
        )
        .await
        .unwrap();

    assert!(analysis.cancelled);
    assert_eq!(classifier.calls(), 0);
    assert_eq!(analysis.items.len(), 3);
    for item in &analysis.items {
        assert_eq!(item.inference.failure, Some(FailureCategory::Cancelled));
        assert_eq!(item.inference.confidence, 0.0);
    }
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_in_flight_call_before_write() {
    let classifier = Arc::new(MockClassifier::new().with_delay(Duration::from_secs(10)));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let analysis = engine
        .analyze(
            &page("https://example.com/", vec![nav(&["Home"])]),
            &AnalyzeOptions::default(),
            &cancel,
        )
        .await
        .unwrap();

    assert!(analysis.cancelled);
    assert_eq!(classifier.calls(), 1);
    assert_eq!(
        analysis.items[0].inference.failure,
        Some(FailureCategory::Cancelled)
    );
    assert!(analysis.retry_events.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_concurrent_analyses_share_single_flight() {
    let classifier = Arc::new(MockClassifier::new().with_delay(Duration::from_millis(20)));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store, settings());
    let snapshot = three_sections("https://example.com/");
    let cancel = CancellationToken::new();
    let options = AnalyzeOptions::default();

    let (a, b) = tokio::join!(
        engine.analyze(&snapshot, &options, &cancel),
        engine.analyze(&snapshot, &options, &cancel)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(classifier.calls(), 3);
    assert_eq!(a.stats.classifier_calls + b.stats.classifier_calls, 3);
    assert_eq!(a.stats.cache_hits + b.stats.cache_hits, 3);
    assert!(engine.in_flight.is_empty());
}

#[tokio::test]
async fn test_low_confidence_does_not_feed_patterns() {
    let classifier = Arc::new(MockClassifier::new().with_confidence(0.5));
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier, store.clone(), settings());

    let analysis = engine
        .analyze(
            &page("https://example.com/", vec![nav(&["Home"])]),
            &AnalyzeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(analysis.stats.pattern_updates, 0);
    let signature = &analysis.items[0].section.structural_signature;
    assert!(store.get_pattern(signature).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pattern_reuse_then_reverify() {
    let classifier = Arc::new(MockClassifier::new().with_confidence(0.95));
    let store = Arc::new(MemoryKnowledgeStore::new());
    for _ in 0..6 {
        store
            .update_pattern("nav>ul>li*", "navigation", 0.95, Utc::now())
            .await
            .unwrap();
    }
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let cancel = CancellationToken::new();

    let mut analysis = engine
        .analyze(
            &page("https://shop.example/", vec![nav(&["Cart", "Deals"])]),
            &AnalyzeOptions::default(),
            &cancel,
        )
        .await
        .unwrap();

    let item = &analysis.items[0];
    assert_eq!(item.inference.source, InferenceSource::PatternReused);
    assert!(item.inference.provisional);
    assert_eq!(item.inference.label, "navigation");
    assert!(item.inference.rationale.contains("6 prior observations"));
    assert_eq!(classifier.calls(), 0);
    assert_eq!(analysis.provisional_count(), 1);

    let stored = store
        .get_current("shop.example", &item.section.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.provisional);

    let stats = engine.reverify(&mut analysis, &cancel).await;
    assert_eq!(stats.classifier_calls, 1);
    assert_eq!(stats.fresh_calls, 1);
    assert_eq!(classifier.calls(), 1);
    let item = &analysis.items[0];
    assert_eq!(item.inference.source, InferenceSource::FreshCall);
    assert!(!item.inference.provisional);
    assert_eq!(analysis.provisional_count(), 0);

    let pattern = store.get_pattern("nav>ul>li*").await.unwrap().unwrap();
    assert_eq!(pattern.sample_count(), 7);
}

#[tokio::test]
async fn test_reverify_classifies_duplicate_ids_once() {
    let classifier = Arc::new(MockClassifier::new().with_confidence(0.95));
    let store = Arc::new(MemoryKnowledgeStore::new());
    for _ in 0..6 {
        store
            .update_pattern("nav>ul>li*", "navigation", 0.95, Utc::now())
            .await
            .unwrap();
    }
    let engine = engine_with(classifier.clone(), store.clone(), settings());
    let cancel = CancellationToken::new();

    let extraction =
        SectionExtractor::default().extract(&page("https://shop.example/", vec![nav(&["Cart"])]));
    let section = extraction.sections[0].clone();
    let mut analysis = engine
        .analyze_sections(
            "shop.example",
            "https://shop.example/",
            None,
            vec![section.clone(), section.clone()],
            false,
            &cancel,
        )
        .await;
    assert_eq!(analysis.provisional_count(), 2);
    assert_eq!(analysis.stats.pattern_reuses, 1);

    let stats = engine.reverify(&mut analysis, &cancel).await;

    assert_eq!(classifier.calls(), 1);
    assert_eq!(stats.classifier_calls, 1);
    assert_eq!(stats.fresh_calls, 1);
    assert_eq!(stats.pattern_updates, 1);
    assert_eq!(analysis.provisional_count(), 0);
    assert!(analysis
        .items
        .iter()
        .all(|item| item.inference.source == InferenceSource::FreshCall));

    let pattern = store.get_pattern("nav>ul>li*").await.unwrap().unwrap();
    assert_eq!(pattern.sample_count(), 7);
    let history = store.history("shop.example", &section.id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_reverify_keeps_provisional_on_failure() {
    let classifier = Arc::new(MockClassifier::new().failing_with([ClassificationError::Rejected {
        status: 403,
        message: "forbidden".to_string(),
    }]));
    let store = Arc::new(MemoryKnowledgeStore::new());
    for _ in 0..6 {
        store
            .update_pattern("nav>ul>li*", "navigation", 0.95, Utc::now())
            .await
            .unwrap();
    }
    let engine = engine_with(classifier, store, settings());
    let cancel = CancellationToken::new();

    let mut analysis = engine
        .analyze(
            &page("https://shop.example/", vec![nav(&["Cart"])]),
            &AnalyzeOptions::default(),
            &cancel,
        )
        .await
        .unwrap();
    let stats = engine.reverify(&mut analysis, &cancel).await;

    assert_eq!(stats.fresh_calls, 0);
    assert_eq!(
        analysis.items[0].inference.source,
        InferenceSource::PatternReused
    );
    assert!(analysis.items[0].inference.provisional);
}

#[tokio::test]
async fn test_store_failures_become_warnings() {
    let classifier = Arc::new(MockClassifier::new());
    let engine = engine_with(classifier.clone(), Arc::new(BrokenStore), settings());

    let analysis = engine
        .analyze(
            &three_sections("https://example.com/"),
            &AnalyzeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(sources(&analysis), vec![InferenceSource::FreshCall; 3]);
    assert_eq!(analysis.stats.store_writes, 0);
    // lookup, pattern lookup, write and pattern update for each section
    assert_eq!(analysis.warnings.len(), 12);
    assert!(analysis
        .warnings
        .iter()
        .all(|w| matches!(w, AnalysisWarning::Store { .. })));
    assert!(analysis.warnings[0].to_string().contains("lookup failed"));
}

#[tokio::test]
async fn test_classifier_sees_page_context() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier.clone(), store, settings());
    let snapshot = page(
        "https://example.com/",
        vec![
            DomNode::new("header")
                .with_text("Example Inc")
                .with_child(nav(&["Home", "Docs"])),
            DomNode::new("footer").with_text("(c) 2024"),
        ],
    );

    engine
        .analyze(&snapshot, &AnalyzeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    let request = classifier.request_for_tag("nav");
    assert_eq!(request.context.site_key, "example.com");
    assert_eq!(request.context.page_title.as_deref(), Some("Example"));
    assert!(request.context.parent.as_deref().unwrap().starts_with("header"));
    assert_eq!(request.context.neighbors.len(), 2);
    assert!(request.context.neighbors[1].starts_with("footer"));
}

#[tokio::test]
async fn test_site_key_resolution() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier, store, settings());
    let cancel = CancellationToken::new();

    let err = engine
        .analyze(
            &three_sections("page.html"),
            &AnalyzeOptions::default(),
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidUrl { .. }));

    let options = AnalyzeOptions {
        site_key: Some("Local/Demo".to_string()),
        ..Default::default()
    };
    let analysis = engine
        .analyze(&three_sections("page.html"), &options, &cancel)
        .await
        .unwrap();
    assert_eq!(analysis.site_key, "local/demo");
}

#[tokio::test]
async fn test_overlay_projection_in_section_order() {
    let classifier = Arc::new(MockClassifier::new());
    let store = Arc::new(MemoryKnowledgeStore::new());
    let engine = engine_with(classifier, store, settings());

    let analysis = engine
        .analyze(
            &three_sections("https://example.com/"),
            &AnalyzeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let overlay = analysis.overlay();

    let labels: Vec<_> = overlay.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["header", "navigation", "footer"]);
    assert_eq!(overlay[1].region.dom_path, "html/body/nav");
    assert!(overlay.iter().all(|o| !o.rationale.is_empty()));
}
