//! Snapshot construction from raw HTML.

use scraper::{ElementRef, Html, Node};
use webinfer_config::{ExtractionConfig, MAX_EXTRACTION_DEPTH};

use crate::dom::{DomNode, DomSnapshot, Viewport};

impl DomSnapshot {
    /// Build a snapshot from markup. There is no geometry, so visibility
    /// comes only from attributes and inline styles.
    pub fn from_html(url: impl Into<String>, html: &str) -> Self {
        Self::from_html_with_depth(url, html, ExtractionConfig::default().max_depth)
    }

    /// Like [`DomSnapshot::from_html`], keeping element nesting to
    /// `max_depth`. Elements one level deeper are kept without children so
    /// extraction reports the truncated subtree.
    pub fn from_html_with_depth(url: impl Into<String>, html: &str, max_depth: usize) -> Self {
        let document = Html::parse_document(html);
        let root = document.root_element();
        let max_depth = max_depth.min(MAX_EXTRACTION_DEPTH);

        Self {
            url: url.into(),
            title: find_title(root).unwrap_or_default(),
            viewport: Viewport::default(),
            root: convert(root, 0, max_depth),
        }
    }
}

fn convert(element: ElementRef<'_>, depth: usize, max_depth: usize) -> DomNode {
    let value = element.value();
    let mut node = DomNode::new(value.name());
    for (name, attr) in value.attrs() {
        node.attributes.insert(name.to_string(), attr.to_string());
    }
    if depth > max_depth {
        return node;
    }

    // Text runs stay in document order: leading text on the node, later
    // runs on the tail of the element they follow.
    let mut run = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(t) => push_run(&mut run, t),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    flush_run(&mut node, &mut run);
                    node.children.push(convert(child_element, depth + 1, max_depth));
                }
            }
            _ => {}
        }
    }
    flush_run(&mut node, &mut run);
    node
}

fn push_run(run: &mut String, piece: &str) {
    let piece = piece.trim();
    if piece.is_empty() {
        return;
    }
    if !run.is_empty() {
        run.push(' ');
    }
    run.push_str(piece);
}

fn flush_run(node: &mut DomNode, run: &mut String) {
    if run.is_empty() {
        return;
    }
    let target = match node.children.last_mut() {
        Some(previous) => &mut previous.tail,
        None => &mut node.text,
    };
    push_run(target, run.as_str());
    run.clear();
}

fn find_title(root: ElementRef<'_>) -> Option<String> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "title")
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
}
