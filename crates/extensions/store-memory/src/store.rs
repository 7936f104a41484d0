//! DashMap-backed knowledge store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use webinfer_protocols::{Inference, KnowledgeStore, Pattern, StoreError};

type RecordKey = (String, String);

/// Inference records for one (site, section), oldest first.
#[derive(Default)]
struct Records {
    entries: Vec<(u64, Inference)>,
}

impl Records {
    fn current(&self) -> Option<&(u64, Inference)> {
        self.entries.last()
    }
}

/// In-memory knowledge store.
///
/// Each key is mutated under its shard lock, so upserts and pattern updates
/// are atomic per key.
#[derive(Default)]
pub struct MemoryKnowledgeStore {
    records: DashMap<RecordKey, Records>,
    patterns: DashMap<String, Pattern>,
    sequence: AtomicU64,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (site, section) keys with at least one record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(site_key: &str, section_id: &str) -> RecordKey {
        (site_key.to_string(), section_id.to_string())
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn get_current(
        &self,
        site_key: &str,
        section_id: &str,
    ) -> Result<Option<Inference>, StoreError> {
        Ok(self
            .records
            .get(&Self::key(site_key, section_id))
            .and_then(|r| r.current().map(|(_, i)| i.clone())))
    }

    async fn upsert(&self, site_key: &str, inference: Inference) -> Result<(), StoreError> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(site_key, &inference.section_id);
        debug!(site_key, section_id = %inference.section_id, "Upserted inference");
        self.records
            .entry(key)
            .or_default()
            .entries
            .push((seq, inference));
        Ok(())
    }

    async fn get_pattern(&self, structural_signature: &str) -> Result<Option<Pattern>, StoreError> {
        Ok(self
            .patterns
            .get(structural_signature)
            .map(|p| p.value().clone()))
    }

    async fn update_pattern(
        &self,
        structural_signature: &str,
        label: &str,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<Pattern, StoreError> {
        let mut entry = self
            .patterns
            .entry(structural_signature.to_string())
            .or_insert_with(|| Pattern::new(structural_signature));
        entry.observe(label, confidence, at);
        Ok(entry.value().clone())
    }

    async fn history(
        &self,
        site_key: &str,
        section_id: &str,
    ) -> Result<Vec<Inference>, StoreError> {
        Ok(self
            .records
            .get(&Self::key(site_key, section_id))
            .map(|r| r.entries.iter().map(|(_, i)| i.clone()).collect())
            .unwrap_or_default())
    }

    async fn site_inferences(&self, site_key: &str) -> Result<Vec<Inference>, StoreError> {
        let mut current: Vec<(u64, Inference)> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == site_key)
            .filter_map(|entry| entry.value().current().cloned())
            .collect();
        current.sort_by_key(|(seq, _)| *seq);
        Ok(current.into_iter().map(|(_, i)| i).collect())
    }

    async fn clear_site(&self, site_key: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        self.records.retain(|key, records| {
            if key.0 == site_key {
                removed += records.entries.len();
                false
            } else {
                true
            }
        });
        debug!(site_key, removed, "Cleared site knowledge");
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
