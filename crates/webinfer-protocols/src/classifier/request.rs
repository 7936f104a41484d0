//! Classification request and response types.

use serde::{Deserialize, Serialize};

use crate::types::Section;

/// Surrounding information that helps disambiguate a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationContext {
    pub site_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,

    /// Summary of the enclosing section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Summaries of the sections immediately before and after.
    #[serde(default)]
    pub neighbors: Vec<String>,
}

/// Request for a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub section_id: String,

    /// Normalized section content.
    pub content: String,

    #[serde(default)]
    pub context: ClassificationContext,
}

impl ClassificationRequest {
    pub fn new(section: &Section, context: ClassificationContext) -> Self {
        Self {
            section_id: section.id.clone(),
            content: section.raw_content.clone(),
            context,
        }
    }
}

/// Parsed classifier answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub rationale: String,
}
