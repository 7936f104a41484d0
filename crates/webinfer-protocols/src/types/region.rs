//! Geometry and locator types owned by the overlay collaborator.

use serde::{Deserialize, Serialize};

/// Bounding box for an element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Check if a point is inside this bounding box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Check if this box intersects with another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Area in square pixels.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when both dimensions reach `min` pixels.
    pub fn at_least(&self, min: f64) -> bool {
        self.width >= min && self.height >= min
    }
}

/// Locator for a section on the rendered page.
///
/// The core never interprets this value; it is carried from the extractor to
/// the overlay so borders and badges can be painted on the right element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingRegion {
    /// CSS selector approximating the element (`#id`, or `tag.class.class`).
    pub selector: String,
    /// Structural path from the document root.
    pub dom_path: String,
    /// Rectangle reported by the browser, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<BoundingBox>,
}
