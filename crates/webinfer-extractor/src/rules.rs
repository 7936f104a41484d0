//! Visibility and candidate rules.

use crate::dom::DomNode;

/// Tags that never render content a user would read.
pub(crate) const IGNORED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "br", "hr", "head", "meta", "link",
];

/// Landmark tags that always start a section.
pub(crate) const LANDMARK_TAGS: &[&str] = &[
    "header", "nav", "main", "section", "article", "aside", "footer", "form", "table",
];

/// Valid element name: ASCII letter followed by letters, digits or `-`.
pub(crate) fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

/// Whether the node and its whole subtree are invisible to the user.
///
/// `tag` must already be lowercase.
pub(crate) fn is_hidden(node: &DomNode, tag: &str) -> bool {
    if IGNORED_TAGS.contains(&tag) {
        return true;
    }
    if node.visible == Some(false) {
        return true;
    }
    if node.attributes.contains_key("hidden") {
        return true;
    }
    if node
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    node.attr("style").is_some_and(style_hides)
}

fn style_hides(style: &str) -> bool {
    let compact = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.split(';').any(|decl| {
        // drop `!important`
        let decl = decl.split('!').next().unwrap_or(decl);
        decl == "display:none" || decl == "visibility:hidden"
    })
}

/// Whether a visible node qualifies as a section root (geometry aside).
pub(crate) fn is_candidate(node: &DomNode, tag: &str) -> bool {
    if tag == "html" || tag == "body" {
        return false;
    }
    if LANDMARK_TAGS.contains(&tag) {
        return true;
    }
    if node.attr_non_empty("role").is_some() || node.attr_non_empty("id").is_some() {
        return true;
    }
    tag == "div"
        && node
            .attr("class")
            .is_some_and(|c| c.contains("content") || c.contains("section"))
}

/// Whether a candidate is large enough to be worth a section.
///
/// Nodes without geometry always qualify.
pub(crate) fn large_enough(node: &DomNode, min_size: f64) -> bool {
    node.rect.is_none_or(|rect| rect.at_least(min_size))
}
