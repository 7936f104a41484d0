//! DOM snapshot types handed over by the browser driver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use webinfer_protocols::BoundingBox;

/// Viewport information for coordinate calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Device pixel ratio.
    #[serde(default = "default_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            device_pixel_ratio: default_pixel_ratio(),
        }
    }
}

fn default_pixel_ratio() -> f64 {
    1.0
}

/// One element of the snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DomNode {
    /// Tag name as reported by the driver. Normalized to lowercase on extraction.
    pub tag: String,

    /// Attributes. Order in the source document is irrelevant.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Direct text of the element before its first child element.
    #[serde(default)]
    pub text: String,

    /// Text following this element inside its parent, up to the next
    /// sibling element. Belongs to the parent, so it stays visible even when
    /// this element is hidden.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tail: String,

    /// Computed visibility, when the driver knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    /// Rendered rectangle, when the driver knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<BoundingBox>,

    #[serde(default)]
    pub children: Vec<DomNode>,
}

impl DomNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    pub fn with_rect(mut self, rect: BoundingBox) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = DomNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Non-empty, trimmed attribute value.
    pub(crate) fn attr_non_empty(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Class tokens, sorted and deduplicated.
    pub fn class_tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self
            .attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        tokens.sort_unstable();
        tokens.dedup();
        tokens
    }
}

/// A captured page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewport: Viewport,
    pub root: DomNode,
}

impl DomSnapshot {
    pub fn new(url: impl Into<String>, root: DomNode) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            viewport: Viewport::default(),
            root,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Parse a snapshot serialized by the browser driver.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
