//! Extracted page sections.

use serde::{Deserialize, Serialize};

use super::BoundingRegion;

/// A contiguous, identifiable region of a page.
///
/// Sections are created fresh on every extraction pass and never mutated.
/// A changed region produces a new section with a new `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Stable fingerprint of structural path and visible text.
    pub id: String,
    /// Tag/role shape descriptor used for cross-site pattern matching.
    pub structural_signature: String,
    /// Normalized text and attributes sent to classification.
    pub raw_content: String,
    /// Hash of `raw_content`, compared against the stored inference.
    pub content_hash: String,
    /// Locator for the overlay collaborator.
    pub bounding_region: BoundingRegion,
    /// Lowercase tag name of the section root.
    pub tag: String,
    /// One-line description used as neighbour context.
    pub summary: String,
    /// Nearest enclosing section, if this one is nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Depth of the section root in the DOM.
    pub depth: usize,
}

/// Soft warning raised while extracting sections. Never fatal to a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionWarning {
    /// DOM path of the offending node.
    pub path: String,
    pub message: String,
}

impl ExtractionWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
