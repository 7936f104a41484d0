//! Classification results for sections.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DominantLabel, Section};
use crate::classifier::Classification;

/// Label carried by degraded inferences.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Where an inference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InferenceSource {
    /// Returned unchanged from the knowledge store.
    CacheHit,
    /// Produced by a classifier call during this analysis.
    FreshCall,
    /// Copied from a cross-site pattern without a classifier call.
    PatternReused,
    /// Classification failed; label is `unknown` and confidence is zero.
    Degraded,
}

impl InferenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheHit => "cache-hit",
            Self::FreshCall => "fresh-call",
            Self::PatternReused => "pattern-reused",
            Self::Degraded => "degraded",
        }
    }
}

impl fmt::Display for InferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InferenceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cache-hit" => Ok(Self::CacheHit),
            "fresh-call" => Ok(Self::FreshCall),
            "pattern-reused" => Ok(Self::PatternReused),
            "degraded" => Ok(Self::Degraded),
            other => Err(format!("unknown inference source: {other}")),
        }
    }
}

/// Why a section ended up with a degraded inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Timeout,
    RateLimited,
    MalformedResponse,
    ProviderUnavailable,
    Rejected,
    Cancelled,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::MalformedResponse => "malformed_response",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Timeout => "the classifier timed out",
            Self::RateLimited => "the classifier kept rate limiting requests",
            Self::MalformedResponse => "the classifier returned an unparseable response",
            Self::ProviderUnavailable => "the classification provider was unavailable",
            Self::Rejected => "the classification provider rejected the request",
            Self::Cancelled => "the page analysis was cancelled before classification",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(Self::Timeout),
            "rate_limited" => Ok(Self::RateLimited),
            "malformed_response" => Ok(Self::MalformedResponse),
            "provider_unavailable" => Ok(Self::ProviderUnavailable),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown failure category: {other}")),
        }
    }
}

/// The classification result for one section at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    pub section_id: String,
    /// Semantic category, open vocabulary, normalized by [`normalize_label`].
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Human-readable explanation. Never empty.
    pub rationale: String,
    pub source: InferenceSource,
    pub timestamp: DateTime<Utc>,
    /// Hash of the section content this inference was made for.
    pub content_hash: String,
    pub structural_signature: String,
    /// Pattern-reused inferences stay provisional until a fresh call confirms them.
    #[serde(default)]
    pub provisional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureCategory>,
}

impl Inference {
    /// Inference backed by a successful classifier call.
    pub fn fresh(section: &Section, classification: Classification) -> Self {
        Self {
            section_id: section.id.clone(),
            label: normalize_label(&classification.label),
            confidence: classification.confidence.clamp(0.0, 1.0),
            rationale: non_empty_rationale(classification.rationale),
            source: InferenceSource::FreshCall,
            timestamp: Utc::now(),
            content_hash: section.content_hash.clone(),
            structural_signature: section.structural_signature.clone(),
            provisional: false,
            failure: None,
        }
    }

    /// Provisional inference copied from a cross-site pattern.
    pub fn from_pattern(section: &Section, dominant: &DominantLabel) -> Self {
        Self {
            section_id: section.id.clone(),
            label: dominant.label.clone(),
            confidence: dominant.aggregate_confidence.clamp(0.0, 1.0),
            rationale: format!(
                "Reused from {} prior observations of structure '{}' labelled '{}' (aggregate confidence {:.2}).",
                dominant.sample_count,
                section.structural_signature,
                dominant.label,
                dominant.aggregate_confidence
            ),
            source: InferenceSource::PatternReused,
            timestamp: Utc::now(),
            content_hash: section.content_hash.clone(),
            structural_signature: section.structural_signature.clone(),
            provisional: true,
            failure: None,
        }
    }

    /// Placeholder emitted when classification could not be completed.
    pub fn degraded(section: &Section, category: FailureCategory, attempts: u32) -> Self {
        let rationale = if category == FailureCategory::Cancelled {
            format!("Unclassified: {}.", category.describe())
        } else {
            format!(
                "Unclassified: {} ({} attempt{}).",
                category.describe(),
                attempts,
                if attempts == 1 { "" } else { "s" }
            )
        };
        Self {
            section_id: section.id.clone(),
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            rationale,
            source: InferenceSource::Degraded,
            timestamp: Utc::now(),
            content_hash: section.content_hash.clone(),
            structural_signature: section.structural_signature.clone(),
            provisional: false,
            failure: Some(category),
        }
    }

    /// The same inference, reported as served from the store.
    pub fn into_cache_hit(mut self) -> Self {
        self.source = InferenceSource::CacheHit;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.source == InferenceSource::Degraded
    }
}

/// Normalize an open-vocabulary label: trimmed, lowercase, single spaces.
pub fn normalize_label(label: &str) -> String {
    let normalized = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        normalized
    }
}

fn non_empty_rationale(rationale: String) -> String {
    let trimmed = rationale.trim();
    if trimmed.is_empty() {
        "No rationale provided by the classifier.".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[path = "inference_tests.rs"]
mod tests;
