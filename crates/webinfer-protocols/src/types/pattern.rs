//! Cross-site label distributions keyed by structural signature.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated evidence for one label of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    /// Sum of observed confidences.
    pub weight: f64,
    pub sample_count: u64,
    /// Running average confidence (`weight / sample_count`).
    pub mean_confidence: f64,
    pub last_seen: DateTime<Utc>,
}

/// Aggregated generalization for a structural signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub structural_signature: String,
    pub labels: BTreeMap<String, LabelStats>,
    pub updated_at: DateTime<Utc>,
}

/// The label a pattern currently stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantLabel {
    pub label: String,
    /// Mean confidence of the label scaled by its share of the total weight.
    pub aggregate_confidence: f64,
    pub sample_count: u64,
}

impl Pattern {
    pub fn new(structural_signature: impl Into<String>) -> Self {
        Self {
            structural_signature: structural_signature.into(),
            labels: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Fold one confirmed observation into the distribution.
    pub fn observe(&mut self, label: &str, confidence: f64, at: DateTime<Utc>) {
        let confidence = confidence.clamp(0.0, 1.0);
        let stats = self
            .labels
            .entry(label.to_string())
            .or_insert_with(|| LabelStats {
                weight: 0.0,
                sample_count: 0,
                mean_confidence: 0.0,
                last_seen: at,
            });

        stats.weight += confidence;
        stats.sample_count += 1;
        stats.mean_confidence = stats.weight / stats.sample_count as f64;
        if at > stats.last_seen {
            stats.last_seen = at;
        }
        if at > self.updated_at {
            self.updated_at = at;
        }
    }

    /// Total observations across all labels.
    pub fn sample_count(&self) -> u64 {
        self.labels.values().map(|s| s.sample_count).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.labels.values().map(|s| s.weight).sum()
    }

    /// Label with the highest accumulated weight; ties go to the most recently seen.
    pub fn dominant(&self) -> Option<DominantLabel> {
        let (label, stats) = self.labels.iter().max_by(|(_, a), (_, b)| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.last_seen.cmp(&b.last_seen))
        })?;

        Some(DominantLabel {
            label: label.clone(),
            aggregate_confidence: self.aggregate_confidence(label),
            sample_count: stats.sample_count,
        })
    }

    /// Mean confidence of `label` scaled by its share of the total weight.
    pub fn aggregate_confidence(&self, label: &str) -> f64 {
        let Some(stats) = self.labels.get(label) else {
            return 0.0;
        };
        let total = self.total_weight();
        if total > 0.0 {
            stats.mean_confidence * (stats.weight / total)
        } else {
            0.0
        }
    }

    /// Dominant label, if it clears both reuse thresholds (strictly).
    pub fn reusable(&self, confidence_threshold: f64, min_support: u64) -> Option<DominantLabel> {
        self.dominant().filter(|d| {
            d.aggregate_confidence > confidence_threshold && d.sample_count > min_support
        })
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
