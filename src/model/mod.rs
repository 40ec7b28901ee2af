//! # Document Model
//!
//! The canonical representation of a designed CV document: a flat list of
//! positioned sections, each holding either an ordered list of text parts or
//! a photo. This is what gets persisted, what the renderer consumes, and
//! what the mapping layer produces from external CV records.
//!
//! The model is deliberately plain data. All mutation goes through
//! [`crate::store::DocumentStore`] commands so the version counter stays
//! honest.

use crate::geometry::Frame;
use crate::style::PartStyle;
use serde::{Deserialize, Serialize};

/// Identifier of a section, allocated by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub u64);

/// Identifier of a part within the document, allocated by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u64);

/// The semantic category of a section. Global field styles are keyed by
/// `(Category, FieldType)`. Serde tags are the lowercase strings the source
/// records use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Work experience entry.
    Erfahrung,
    /// Education entry.
    Ausbildung,
    /// Personal summary / profile block.
    Profil,
    /// Contact details block.
    Kontakt,
    /// Anything user-created that doesn't map to source data.
    #[serde(untagged)]
    Custom(String),
}

/// What kind of text field a part is. Selection and global styles address
/// parts by this tag, never by primitive identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Title,
    Company,
    Period,
    Bullet,
    Heading,
    Label,
    Value,
}

/// A single text field inside a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: PartId,
    pub field: FieldType,
    #[serde(default)]
    pub text: String,
    /// Horizontal indent inside the section's content box (bullets get a
    /// default of [`crate::layout::BULLET_INDENT`]).
    #[serde(default)]
    pub indent: f64,
    /// Vertical gap inserted before this part when stacking.
    #[serde(default)]
    pub gap_before: f64,
    /// Explicit width override. `None` means "fill the content width minus
    /// indent".
    #[serde(default)]
    pub width: Option<f64>,
    /// Local style override; merged attribute-by-attribute over the global
    /// style table and document tokens.
    #[serde(default)]
    pub style: PartStyle,
    /// Stacking position. Parts render in ascending order regardless of
    /// their position in the vec.
    pub order: u32,
    /// Set when the user has edited this part's text directly. Locked parts
    /// are never overwritten by a re-mapping pass.
    #[serde(default)]
    pub locked: bool,
}

/// The content of a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SectionBody {
    /// An ordered list of text parts, stacked top to bottom.
    Fields {
        #[serde(default)]
        parts: Vec<Part>,
    },
    /// A photo. Resizing preserves the aspect ratio; no text stacking.
    Photo {
        /// height / width.
        aspect_ratio: f64,
    },
}

impl SectionBody {
    pub fn parts(&self) -> &[Part] {
        match self {
            SectionBody::Fields { parts } => parts,
            SectionBody::Photo { .. } => &[],
        }
    }

    pub fn parts_mut(&mut self) -> Option<&mut Vec<Part>> {
        match self {
            SectionBody::Fields { parts } => Some(parts),
            SectionBody::Photo { .. } => None,
        }
    }
}

/// A positioned, resizable container holding one logical document block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub category: Category,
    /// Document-space frame: top-left + size, margin-relative.
    pub frame: Frame,
    pub body: SectionBody,
    /// Hidden sections produce no visuals and are skipped by hit testing.
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Locked sections ignore move/resize events.
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Stable key matching this section to an external source entity, e.g.
    /// `experience:3`. `None` for purely user-created sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Section {
    /// Create a fields section with sensible flags. The store assigns ids.
    pub fn fields(id: SectionId, category: Category, frame: Frame, parts: Vec<Part>) -> Self {
        Self {
            id,
            category,
            frame,
            body: SectionBody::Fields { parts },
            visible: true,
            locked: false,
            title: None,
            source_key: None,
        }
    }

    /// Parts in stacking order (ascending order index, stable for ties).
    pub fn ordered_parts(&self) -> Vec<&Part> {
        let mut parts: Vec<&Part> = self.body.parts().iter().collect();
        parts.sort_by_key(|p| p.order);
        parts
    }

    pub fn find_part(&self, field: FieldType) -> Option<&Part> {
        self.body.parts().iter().find(|p| p.field == field)
    }
}

/// A blueprint for [`crate::store::DocumentStore::add_section`]: everything
/// a section needs except the ids.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub category: Category,
    pub frame: Frame,
    pub body: SectionBodySpec,
    pub title: Option<String>,
    pub source_key: Option<String>,
}

/// Body blueprint; part ids are assigned by the store.
#[derive(Debug, Clone)]
pub enum SectionBodySpec {
    Fields(Vec<PartSpec>),
    Photo { aspect_ratio: f64 },
}

/// A blueprint for one part.
#[derive(Debug, Clone)]
pub struct PartSpec {
    pub field: FieldType,
    pub text: String,
    pub indent: f64,
    pub gap_before: f64,
    pub style: PartStyle,
    pub order: u32,
}

impl PartSpec {
    pub fn new(field: FieldType, text: impl Into<String>, order: u32) -> Self {
        Self {
            field,
            text: text.into(),
            indent: 0.0,
            gap_before: 0.0,
            style: PartStyle::default(),
            order,
        }
    }

    pub fn with_gap(mut self, gap_before: f64) -> Self {
        self.gap_before = gap_before;
        self
    }

    pub fn with_indent(mut self, indent: f64) -> Self {
        self.indent = indent;
        self
    }
}
