//! # Snapshot Persistence & Pre-Export Checks
//!
//! The save/load round-trip for a designed document, plus the checks export
//! adapters run before rendering: which sections overflow the page, which
//! sit uncomfortably close to the margins.
//!
//! The snapshot is plain JSON with a format tag, so an old build rejects a
//! newer file with a real error instead of mangling it.

use crate::error::DesignError;
use crate::geometry::Margins;
use crate::model::{Section, SectionId};
use crate::store::DocumentStore;
use crate::style::{GlobalStyles, TypographyTokens};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Format tag written into every snapshot.
pub const SNAPSHOT_FORMAT: &str = "entwurf/1";

/// The persisted document: everything needed to restore the designer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub format: String,
    /// Milliseconds since the Unix epoch at save time.
    pub saved_at_ms: u64,
    pub margins: Margins,
    pub tokens: TypographyTokens,
    #[serde(default)]
    pub global_styles: GlobalStyles,
    pub sections: Vec<Section>,
}

/// Capture the current store state as a snapshot.
pub fn capture(store: &DocumentStore) -> DocumentSnapshot {
    DocumentSnapshot {
        format: SNAPSHOT_FORMAT.to_string(),
        saved_at_ms: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
        margins: *store.margins(),
        tokens: store.tokens().clone(),
        global_styles: store.global_styles().clone(),
        sections: store.sections().to_vec(),
    }
}

/// Serialize the current store state to snapshot JSON.
pub fn save_json(store: &DocumentStore) -> Result<String, DesignError> {
    Ok(serde_json::to_string_pretty(&capture(store))?)
}

/// Restore a store from snapshot JSON. Rejects unknown format tags.
pub fn load_json(store: &mut DocumentStore, json: &str) -> Result<(), DesignError> {
    let snapshot: DocumentSnapshot = serde_json::from_str(json).map_err(DesignError::parse)?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(DesignError::UnsupportedFormat {
            found: snapshot.format,
            expected: SNAPSHOT_FORMAT.to_string(),
        });
    }
    store.restore(
        snapshot.sections,
        snapshot.margins,
        snapshot.tokens,
        snapshot.global_styles,
    );
    Ok(())
}

/// The page the document is destined for, in the same px units as frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for PageBounds {
    fn default() -> Self {
        // A4 at 96 dpi.
        Self {
            width: 794.0,
            height: 1123.0,
        }
    }
}

/// Sections whose bottom edge leaves the printable area. Document space is
/// margin-relative, so the printable height is the page minus both vertical
/// margins.
pub fn overflow_warnings(store: &DocumentStore, page: PageBounds) -> Vec<SectionId> {
    let printable_height = page.height - store.margins().vertical();
    store
        .sections()
        .iter()
        .filter(|s| s.visible && s.frame.y + s.frame.height > printable_height)
        .map(|s| s.id)
        .collect()
}

/// Sections closer than `threshold` to any edge of the printable area
/// (including hanging out of it on the left/top).
pub fn near_margin_warnings(store: &DocumentStore, page: PageBounds, threshold: f64) -> Vec<SectionId> {
    let printable_width = page.width - store.margins().horizontal();
    let printable_height = page.height - store.margins().vertical();
    store
        .sections()
        .iter()
        .filter(|s| {
            s.visible
                && (s.frame.x < threshold
                    || s.frame.y < threshold
                    || s.frame.x + s.frame.width > printable_width - threshold
                    || s.frame.y + s.frame.height > printable_height - threshold)
        })
        .map(|s| s.id)
        .collect()
}
