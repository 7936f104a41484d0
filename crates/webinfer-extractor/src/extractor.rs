//! Section extraction pass.

use std::collections::HashMap;

use tracing::debug;
use webinfer_config::ExtractionConfig;
use webinfer_protocols::{BoundingRegion, ExtractionWarning, Section};

use crate::dom::{DomNode, DomSnapshot};
use crate::identity::{
    collapse_whitespace, content_hash, path_segment, section_id, structural_signature,
    truncate_chars,
};
use crate::rules::{is_candidate, is_hidden, is_valid_tag, large_enough};

const SUMMARY_CHARS: usize = 60;
const INTERACTIVE_TAGS: &[&str] = &["input", "select", "textarea", "button"];

/// Result of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Sections in document order.
    pub sections: Vec<Section>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Segments DOM snapshots into sections.
#[derive(Debug, Clone, Default)]
pub struct SectionExtractor {
    config: ExtractionConfig,
}

impl SectionExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract sections from a snapshot. Never fails; problems become warnings.
    pub fn extract(&self, snapshot: &DomSnapshot) -> Extraction {
        let mut pass = Pass {
            config: &self.config,
            sections: Vec::new(),
            warnings: Vec::new(),
            occurrences: HashMap::new(),
            limit_hit: false,
        };
        pass.walk(&snapshot.root, "", 0, None);

        debug!(
            url = %snapshot.url,
            sections = pass.sections.len(),
            warnings = pass.warnings.len(),
            "Extracted sections"
        );

        Extraction {
            sections: pass.sections,
            warnings: pass.warnings,
        }
    }
}

struct Pass<'a> {
    config: &'a ExtractionConfig,
    sections: Vec<Section>,
    warnings: Vec<ExtractionWarning>,
    occurrences: HashMap<(String, String), usize>,
    limit_hit: bool,
}

impl Pass<'_> {
    fn walk(&mut self, node: &DomNode, parent_path: &str, depth: usize, parent: Option<&str>) {
        if self.limit_hit {
            return;
        }

        let tag = node.tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            self.warnings.push(ExtractionWarning::new(
                join_path(parent_path, "?"),
                "empty tag name; subtree skipped",
            ));
            return;
        }
        if !is_valid_tag(&tag) {
            self.warnings.push(ExtractionWarning::new(
                join_path(parent_path, "?"),
                format!("invalid tag name '{}'; subtree skipped", node.tag),
            ));
            return;
        }

        let path = join_path(parent_path, &path_segment(&tag, node));
        if depth > self.config.max_depth {
            self.warnings.push(ExtractionWarning::new(
                path,
                format!(
                    "nesting deeper than {} levels; subtree skipped",
                    self.config.max_depth
                ),
            ));
            return;
        }

        if is_hidden(node, &tag) {
            return;
        }

        let mut current = parent.map(str::to_string);
        if is_candidate(node, &tag) && large_enough(node, self.config.min_element_size) {
            if self.sections.len() >= self.config.max_sections {
                self.limit_hit = true;
                self.warnings.push(ExtractionWarning::new(
                    path,
                    format!(
                        "section limit of {} reached; remaining candidates skipped",
                        self.config.max_sections
                    ),
                ));
                return;
            }
            let section = self.build_section(node, &tag, &path, depth, parent);
            current = Some(section.id.clone());
            self.sections.push(section);
        }

        for child in &node.children {
            self.walk(child, &path, depth + 1, current.as_deref());
        }
    }

    fn build_section(
        &mut self,
        node: &DomNode,
        tag: &str,
        path: &str,
        depth: usize,
        parent: Option<&str>,
    ) -> Section {
        let mut stats = ContentStats::default();
        stats.collect(node, depth, self.config.max_depth);
        let text = collapse_whitespace(&stats.text);

        let occurrence = self
            .occurrences
            .entry((path.to_string(), text.clone()))
            .or_insert(0);
        let id = section_id(path, &text, *occurrence);
        *occurrence += 1;

        let structural_signature = structural_signature(node);
        let raw_content = render_content(
            tag,
            node,
            &structural_signature,
            &stats,
            truncate_chars(&text, self.config.max_text_chars),
        );

        Section {
            id,
            content_hash: content_hash(&raw_content),
            structural_signature,
            raw_content,
            bounding_region: BoundingRegion {
                selector: css_selector(tag, node),
                dom_path: path.to_string(),
                rect: node.rect,
            },
            tag: tag.to_string(),
            summary: summarize(tag, node, &text),
            parent_id: parent.map(str::to_string),
            depth,
        }
    }
}

/// Visible text and element counts of a subtree.
#[derive(Default)]
struct ContentStats {
    text: String,
    links: usize,
    inputs: usize,
}

impl ContentStats {
    /// Walks in document order: own text, then each visible child followed
    /// by its tail.
    fn collect(&mut self, node: &DomNode, depth: usize, max_depth: usize) {
        self.push_text(&node.text);
        if depth >= max_depth {
            return;
        }
        for child in &node.children {
            let tag = child.tag.trim().to_ascii_lowercase();
            if is_valid_tag(&tag) && !is_hidden(child, &tag) {
                if tag == "a" {
                    self.links += 1;
                } else if INTERACTIVE_TAGS.contains(&tag.as_str()) {
                    self.inputs += 1;
                }
                self.collect(child, depth + 1, max_depth);
            }
            self.push_text(&child.tail);
        }
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.push(' ');
            self.text.push_str(text);
        }
    }
}

fn render_content(
    tag: &str,
    node: &DomNode,
    signature: &str,
    stats: &ContentStats,
    text: &str,
) -> String {
    let mut lines = vec![format!("tag: {}", tag)];
    if let Some(role) = node.attr_non_empty("role") {
        lines.push(format!("role: {}", role));
    }
    if let Some(id) = node.attr_non_empty("id") {
        lines.push(format!("id: {}", id));
    }
    let classes = node.class_tokens();
    if !classes.is_empty() {
        lines.push(format!("classes: {}", classes.join(" ")));
    }
    for attr in ["aria-label", "title", "action"] {
        if let Some(value) = node.attr_non_empty(attr) {
            lines.push(format!("{}: {}", attr, collapse_whitespace(value)));
        }
    }
    lines.push(format!("structure: {}", signature));
    if stats.links > 0 {
        lines.push(format!("links: {}", stats.links));
    }
    if stats.inputs > 0 {
        lines.push(format!("inputs: {}", stats.inputs));
    }
    lines.push(format!("text: {}", text));
    lines.join("\n")
}

fn css_selector(tag: &str, node: &DomNode) -> String {
    if let Some(id) = node.attr_non_empty("id") {
        return format!("#{}", id);
    }
    let mut selector = tag.to_string();
    for class in node.class_tokens().into_iter().take(2) {
        selector.push('.');
        selector.push_str(class);
    }
    selector
}

fn summarize(tag: &str, node: &DomNode, text: &str) -> String {
    let label = match node.attr_non_empty("role") {
        Some(role) => format!("{}[{}]", tag, role),
        None => tag.to_string(),
    };
    if text.is_empty() {
        return format!("{} (no text)", label);
    }
    let preview = truncate_chars(text, SUMMARY_CHARS);
    if preview.len() < text.len() {
        format!("{}: {}...", label, preview)
    } else {
        format!("{}: {}", label, preview)
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
