use super::*;
use std::sync::Arc;

use webinfer_protocols::InferenceSource;

fn inference(section_id: &str, label: &str) -> Inference {
    Inference {
        section_id: section_id.to_string(),
        label: label.to_string(),
        confidence: 0.9,
        rationale: "test".to_string(),
        source: InferenceSource::FreshCall,
        timestamp: Utc::now(),
        content_hash: "hash".to_string(),
        structural_signature: "sig".to_string(),
        provisional: false,
        failure: None,
    }
}

#[tokio::test]
async fn test_store_id() {
    let store = MemoryKnowledgeStore::new();
    assert_eq!(store.id(), "memory");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_upsert_replaces_current_and_keeps_history() {
    let store = MemoryKnowledgeStore::new();
    store.upsert("a.com", inference("s1", "menu")).await.unwrap();
    store
        .upsert("a.com", inference("s1", "navigation"))
        .await
        .unwrap();

    let current = store.get_current("a.com", "s1").await.unwrap().unwrap();
    assert_eq!(current.label, "navigation");
    assert_eq!(store.history("a.com", "s1").await.unwrap().len(), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_site_inferences_in_write_order() {
    let store = MemoryKnowledgeStore::new();
    store.upsert("a.com", inference("s2", "footer")).await.unwrap();
    store.upsert("a.com", inference("s1", "header")).await.unwrap();
    store.upsert("b.com", inference("s1", "header")).await.unwrap();

    let current = store.site_inferences("a.com").await.unwrap();
    let ids: Vec<_> = current.iter().map(|i| i.section_id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);
}

#[tokio::test]
async fn test_clear_site() {
    let store = MemoryKnowledgeStore::new();
    store.upsert("a.com", inference("s1", "menu")).await.unwrap();
    store.upsert("a.com", inference("s1", "nav")).await.unwrap();
    store.upsert("b.com", inference("s1", "nav")).await.unwrap();
    store.update_pattern("sig", "nav", 0.9, Utc::now()).await.unwrap();

    assert_eq!(store.clear_site("a.com").await.unwrap(), 2);
    assert!(store.get_current("a.com", "s1").await.unwrap().is_none());
    assert!(store.get_current("b.com", "s1").await.unwrap().is_some());
    // patterns survive
    assert!(store.get_pattern("sig").await.unwrap().is_some());
}

#[tokio::test]
async fn test_update_pattern_returns_updated() {
    let store = MemoryKnowledgeStore::new();
    let pattern = store
        .update_pattern("sig", "navigation", 0.9, Utc::now())
        .await
        .unwrap();
    assert_eq!(pattern.sample_count(), 1);
    let pattern = store
        .update_pattern("sig", "navigation", 0.7, Utc::now())
        .await
        .unwrap();
    assert_eq!(pattern.sample_count(), 2);
    assert_eq!(store.get_pattern("sig").await.unwrap().unwrap(), pattern);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes() {
    let store = Arc::new(MemoryKnowledgeStore::new());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .upsert("a.com", inference("s1", &format!("label-{i}")))
                    .await
                    .unwrap();
                store
                    .update_pattern("sig", "navigation", 0.9, Utc::now())
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.history("a.com", "s1").await.unwrap().len(), 16);
    assert_eq!(store.site_inferences("a.com").await.unwrap().len(), 1);
    assert_eq!(
        store.get_pattern("sig").await.unwrap().unwrap().sample_count(),
        16
    );
}
