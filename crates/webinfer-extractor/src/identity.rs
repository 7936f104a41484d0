//! Section identity: structural paths, fingerprints and signatures.

use sha2::{Digest, Sha256};

use crate::dom::DomNode;
use crate::rules::{is_hidden, is_valid_tag};

/// Separator between the hashed components of a section id.
const FIELD_SEPARATOR: char = '\u{241E}';

/// Levels below the section root that contribute to its signature.
pub const SIGNATURE_DEPTH: usize = 2;

/// Path segment for one element: `tag`, then `[role]` and `#id` when present.
pub fn path_segment(tag: &str, node: &DomNode) -> String {
    let mut segment = tag.to_string();
    if let Some(role) = node.attr_non_empty("role") {
        segment.push('[');
        segment.push_str(&role.to_ascii_lowercase());
        segment.push(']');
    }
    if let Some(id) = node.attr_non_empty("id") {
        segment.push('#');
        segment.push_str(id);
    }
    segment
}

/// Stable fingerprint of a section.
///
/// `occurrence` numbers identical `(path, text)` pairs in document order so
/// that repeated widgets get distinct but reproducible ids.
pub fn section_id(path: &str, text: &str, occurrence: usize) -> String {
    let input = format!(
        "{path}{FIELD_SEPARATOR}{text}{FIELD_SEPARATOR}{occurrence}"
    );
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    digest[..32].to_string()
}

/// Hash of the content sent to classification.
pub fn content_hash(raw_content: &str) -> String {
    format!("{:x}", Sha256::digest(raw_content.as_bytes()))
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim_end().to_string()
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Tag/role shape of a node and its visible descendants, independent of text.
///
/// Consecutive siblings with the same shape collapse into `shape*`; a single
/// child group is written `parent>child`, several `parent>(a,b*)`.
pub fn structural_signature(node: &DomNode) -> String {
    shape(node, &node.tag.to_ascii_lowercase(), SIGNATURE_DEPTH)
}

fn shape(node: &DomNode, tag: &str, levels: usize) -> String {
    let mut label = tag.to_string();
    if let Some(role) = node.attr_non_empty("role") {
        label.push('[');
        label.push_str(&role.to_ascii_lowercase());
        label.push(']');
    }
    if levels == 0 {
        return label;
    }

    let mut groups: Vec<(String, usize)> = Vec::new();
    for child in &node.children {
        let child_tag = child.tag.trim().to_ascii_lowercase();
        if !is_valid_tag(&child_tag) || is_hidden(child, &child_tag) {
            continue;
        }
        let child_shape = shape(child, &child_tag, levels - 1);
        match groups.last_mut() {
            Some((last, count)) if *last == child_shape => *count += 1,
            _ => groups.push((child_shape, 1)),
        }
    }

    let rendered: Vec<String> = groups
        .into_iter()
        .map(|(s, count)| if count > 1 { format!("{s}*") } else { s })
        .collect();

    match rendered.len() {
        0 => label,
        1 => format!("{label}>{}", rendered[0]),
        _ => format!("{label}>({})", rendered.join(",")),
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
