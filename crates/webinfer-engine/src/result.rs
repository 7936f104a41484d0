//! Page analysis results and the overlay projection.

use std::fmt;

use serde::{Deserialize, Serialize};
use webinfer_config::OverlayConfig;
use webinfer_protocols::{BoundingRegion, ExtractionWarning, Inference, InferenceSource, Section};

use crate::stats::{AnalysisStats, RetryEvent};

/// A section together with its current inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSection {
    pub section: Section,
    pub inference: Inference,
}

/// Soft problem encountered during an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    Extraction(ExtractionWarning),
    Store { section_id: String, message: String },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(warning) => write!(f, "extraction: {}", warning),
            Self::Store {
                section_id,
                message,
            } => write!(f, "store ({}): {}", section_id, message),
        }
    }
}

/// Result of analysing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub analysis_id: String,
    pub site_key: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// One entry per extracted section, in document order.
    pub items: Vec<ScoredSection>,
    pub warnings: Vec<AnalysisWarning>,
    pub retry_events: Vec<RetryEvent>,
    pub stats: AnalysisStats,
    pub cancelled: bool,
}

impl PageAnalysis {
    /// Projection consumed by the overlay renderer, in section order.
    pub fn overlay(&self) -> Vec<OverlayItem> {
        self.items
            .iter()
            .map(|item| OverlayItem {
                section_id: item.section.id.clone(),
                region: item.section.bounding_region.clone(),
                label: item.inference.label.clone(),
                confidence: item.inference.confidence,
                rationale: item.inference.rationale.clone(),
                source: item.inference.source,
                provisional: item.inference.provisional,
            })
            .collect()
    }

    /// Sections whose inference still awaits confirmation by a fresh call.
    pub fn provisional_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.inference.provisional)
            .count()
    }
}

/// What the overlay needs to draw one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayItem {
    pub section_id: String,
    pub region: BoundingRegion,
    pub label: String,
    pub confidence: f64,
    pub rationale: String,
    pub source: InferenceSource,
    pub provisional: bool,
}

/// Presentation bucket for a confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f64, thresholds: &OverlayConfig) -> Self {
        if confidence >= thresholds.high_confidence {
            Self::High
        } else if confidence >= thresholds.medium_confidence {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
