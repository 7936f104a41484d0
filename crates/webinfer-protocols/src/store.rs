//! Knowledge store protocol definitions.
//!
//! A knowledge store keeps the current inference per (site, section), the
//! history of superseded inferences, and the cross-site pattern table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::{Inference, Pattern};

/// Core trait for knowledge store backends.
///
/// Implementations must be safe for concurrent use. `upsert` and
/// `update_pattern` are atomic: concurrent readers never see a half-written
/// record, and concurrent `update_pattern` calls for the same signature never
/// lose an observation.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Current inference for a section of a site, if any.
    async fn get_current(
        &self,
        site_key: &str,
        section_id: &str,
    ) -> Result<Option<Inference>, StoreError>;

    /// Make `inference` the current record for its section. The previous
    /// current record, if any, moves to history.
    async fn upsert(&self, site_key: &str, inference: Inference) -> Result<(), StoreError>;

    /// Pattern accumulated for a structural signature.
    async fn get_pattern(&self, structural_signature: &str) -> Result<Option<Pattern>, StoreError>;

    /// Fold one observation into the pattern for `structural_signature`,
    /// creating it if needed, and return the updated pattern.
    async fn update_pattern(
        &self,
        structural_signature: &str,
        label: &str,
        confidence: f64,
        at: DateTime<Utc>,
    ) -> Result<Pattern, StoreError>;

    /// All inferences ever recorded for a section, oldest first, current last.
    async fn history(&self, site_key: &str, section_id: &str)
    -> Result<Vec<Inference>, StoreError>;

    /// Current inferences for every section of a site.
    async fn site_inferences(&self, site_key: &str) -> Result<Vec<Inference>, StoreError>;

    /// Forget everything recorded for a site. Patterns are kept.
    /// Returns the number of inference records removed.
    async fn clear_site(&self, site_key: &str) -> Result<usize, StoreError>;
}
