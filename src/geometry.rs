//! # Geometry
//!
//! Frames, margins, and the translation between the two coordinate spaces
//! this engine lives in:
//!
//! - **Document space**: top-left-anchored, margin-relative. This is what
//!   gets persisted and what export adapters consume.
//! - **Render space**: center-anchored, absolute canvas coordinates. This is
//!   what the canvas gives us back after a move or resize.
//!
//! The translation is margin-aware in both directions and must round-trip
//! exactly for unchanged geometry — resize write-back depends on it.

use serde::{Deserialize, Serialize};

/// A point in either coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A document-space rectangle: top-left corner plus size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Grow the rectangle by `amount` on every side.
    pub fn inflated(&self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// A partial frame update. `None` fields are left untouched by
/// [`crate::store::DocumentStore::update_frame`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FramePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl FramePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, frame: &mut Frame) {
        if let Some(x) = self.x {
            frame.x = x;
        }
        if let Some(y) = self.y {
            frame.y = y;
        }
        if let Some(w) = self.width {
            frame.width = w;
        }
        if let Some(h) = self.height {
            frame.height = h;
        }
    }
}

/// Document margins (top, right, bottom, left). Every translation between
/// document space and render space goes through these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Translate a render-space group center into a document-space top-left
/// corner for a group of the given size.
pub fn render_center_to_doc_origin(center: Point, width: f64, height: f64, margins: &Margins) -> Point {
    Point {
        x: center.x - width / 2.0 - margins.left,
        y: center.y - height / 2.0 - margins.top,
    }
}

/// Translate a document-space frame into its render-space center.
pub fn doc_frame_to_render_center(frame: &Frame, margins: &Margins) -> Point {
    Point {
        x: frame.x + frame.width / 2.0 + margins.left,
        y: frame.y + frame.height / 2.0 + margins.top,
    }
}

/// Translate a document-space frame into a render-space top-left point
/// (margin offset only; the anchor stays top-left). Used when positioning
/// child primitives inside a section group.
pub fn doc_frame_to_render_origin(frame: &Frame, margins: &Margins) -> Point {
    Point {
        x: frame.x + margins.left,
        y: frame.y + margins.top,
    }
}
