//! # Style System
//!
//! Per-part typography with a four-level cascade, resolved independently
//! per attribute:
//!
//! 1. local part override
//! 2. global field style keyed by `(Category, FieldType)`
//! 3. document-wide typography tokens
//! 4. built-in per-field fallback
//!
//! We don't try to model general rich text. Parts carry exactly the
//! attributes the designer exposes, and we resolve them correctly.

use crate::model::{Category, FieldType};
use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        // Multi-byte characters would land slicing mid-codepoint below.
        if !hex.is_ascii() {
            return Color::BLACK;
        }
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A partial style: every attribute optional, merged over lower cascade
/// levels. Also the patch shape for style mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartStyle {
    pub font_family: Option<String>,
    /// Font size in px.
    pub font_size: Option<f64>,
    /// Font weight (100-900).
    pub font_weight: Option<u32>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
    /// Line height as a multiplier of font size.
    pub line_height: Option<f64>,
    /// Letter spacing in px.
    pub letter_spacing: Option<f64>,
}

impl PartStyle {
    pub fn is_empty(&self) -> bool {
        *self == PartStyle::default()
    }

    /// Merge `patch` onto `self`: set attributes win, unset ones are kept.
    pub fn merge(&mut self, patch: &PartStyle) {
        if patch.font_family.is_some() {
            self.font_family = patch.font_family.clone();
        }
        if patch.font_size.is_some() {
            self.font_size = patch.font_size;
        }
        if patch.font_weight.is_some() {
            self.font_weight = patch.font_weight;
        }
        if patch.italic.is_some() {
            self.italic = patch.italic;
        }
        if patch.color.is_some() {
            self.color = patch.color;
        }
        if patch.line_height.is_some() {
            self.line_height = patch.line_height;
        }
        if patch.letter_spacing.is_some() {
            self.letter_spacing = patch.letter_spacing;
        }
    }
}

/// Document-wide typography tokens, supplied externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyTokens {
    pub font_family: String,
    /// Base font size in px.
    pub base_size: f64,
    pub line_height: f64,
    pub primary_color: Color,
}

impl Default for TypographyTokens {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            base_size: 11.0,
            line_height: 1.4,
            primary_color: Color::BLACK,
        }
    }
}

/// One entry of the global style table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStyleEntry {
    pub category: Category,
    pub field: FieldType,
    pub style: PartStyle,
}

/// The global style table: one partial style per `(Category, FieldType)`,
/// applied to every part of that key without a local override for the
/// attribute in question. Kept as a list so the snapshot format stays plain
/// JSON (tuple keys don't survive a JSON map).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalStyles {
    entries: Vec<GlobalStyleEntry>,
}

impl GlobalStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &Category, field: FieldType) -> Option<&PartStyle> {
        self.entries
            .iter()
            .find(|e| e.category == *category && e.field == field)
            .map(|e| &e.style)
    }

    /// Merge a patch into the entry for `(category, field)`, creating it if
    /// absent.
    pub fn merge(&mut self, category: Category, field: FieldType, patch: &PartStyle) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.category == category && e.field == field)
        {
            Some(entry) => entry.style.merge(patch),
            None => self.entries.push(GlobalStyleEntry {
                category,
                field,
                style: patch.clone(),
            }),
        }
    }
}

/// Fully resolved style: all values concrete. This is what measurement and
/// rendering work with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPartStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub italic: bool,
    pub color: Color,
    pub line_height: f64,
    pub letter_spacing: f64,
}

impl ResolvedPartStyle {
    /// Height of one wrapped line in px.
    pub fn line_height_px(&self) -> f64 {
        self.font_size * self.line_height
    }
}

/// Built-in last-resort defaults per field type: size relative to the token
/// base size, plus weight. These only apply where neither the part, the
/// global table, nor the tokens say anything.
fn builtin_fallback(field: FieldType, tokens: &TypographyTokens) -> (f64, u32) {
    match field {
        FieldType::Title => (tokens.base_size * 1.2, 600),
        FieldType::Heading => (tokens.base_size * 1.45, 700),
        FieldType::Company => (tokens.base_size, 400),
        FieldType::Period => (tokens.base_size * 0.9, 400),
        FieldType::Bullet => (tokens.base_size, 400),
        FieldType::Label => (tokens.base_size * 0.9, 600),
        FieldType::Value => (tokens.base_size, 400),
    }
}

/// Resolve the cascade for one part. Every attribute is looked up
/// independently; a local font size never drags a local color with it.
pub fn resolve_part_style(
    local: &PartStyle,
    category: &Category,
    field: FieldType,
    globals: &GlobalStyles,
    tokens: &TypographyTokens,
) -> ResolvedPartStyle {
    let global = globals.get(category, field);
    let (fallback_size, fallback_weight) = builtin_fallback(field, tokens);

    ResolvedPartStyle {
        font_family: local
            .font_family
            .clone()
            .or_else(|| global.and_then(|g| g.font_family.clone()))
            .unwrap_or_else(|| tokens.font_family.clone()),
        font_size: local
            .font_size
            .or(global.and_then(|g| g.font_size))
            .unwrap_or(fallback_size),
        font_weight: local
            .font_weight
            .or(global.and_then(|g| g.font_weight))
            .unwrap_or(fallback_weight),
        italic: local
            .italic
            .or(global.and_then(|g| g.italic))
            .unwrap_or(false),
        color: local
            .color
            .or(global.and_then(|g| g.color))
            .unwrap_or(tokens.primary_color),
        line_height: local
            .line_height
            .or(global.and_then(|g| g.line_height))
            .unwrap_or(tokens.line_height),
        letter_spacing: local
            .letter_spacing
            .or(global.and_then(|g| g.letter_spacing))
            .unwrap_or(0.0),
    }
}
