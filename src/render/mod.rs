//! # Section Renderer
//!
//! Rebuilds the visual primitives for every section from the current store
//! state. There is no incremental reconciliation: each build produces a
//! fresh [`Scene`], and anything that must survive a rebuild (selection,
//! hover) is carried by *logical* identity — `(SectionId, FieldType)` —
//! never by primitive reference.
//!
//! Per visible section the scene holds an oversized invisible hit region
//! (reliable pointer targeting over the padding), a visible bordered frame,
//! and one text run per part. Runs are positioned by the same
//! [`crate::layout::stack_parts`] routine the reflow engine uses, so the
//! initial render and a post-resize reflow agree exactly.

use crate::geometry::{doc_frame_to_render_origin, Frame, Point};
use crate::layout::ReflowEngine;
use crate::model::{PartId, SectionBody, SectionId};
use crate::select::PartRef;
use crate::store::DocumentStore;
use crate::style::ResolvedPartStyle;
use crate::text::Line;

/// Extra reach of the hit region beyond the visible frame, in px.
const HIT_REGION_SLOP: f64 = 8.0;

/// One positioned text run, in absolute render-space coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRunPrimitive {
    pub section: SectionId,
    pub part_id: PartId,
    pub field: crate::model::FieldType,
    pub bounds: Frame,
    pub style: ResolvedPartStyle,
    pub lines: Vec<Line>,
    /// Selection decoration, reapplied after every rebuild.
    pub selected: bool,
    pub hovered: bool,
}

impl TextRunPrimitive {
    pub fn logical_key(&self) -> PartRef {
        PartRef {
            section: self.section,
            field: self.field,
        }
    }
}

/// The visuals of one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionVisual {
    pub section: SectionId,
    /// Invisible, oversized pointer target.
    pub hit_region: Frame,
    /// Visible bordered frame, render space.
    pub frame: Frame,
    pub runs: Vec<TextRunPrimitive>,
    /// Set for photo sections; they render a placeholder instead of runs.
    pub is_photo: bool,
}

/// A full rebuild of the canvas for one store version.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub visuals: Vec<SectionVisual>,
    /// The store version this scene was built from.
    pub version: u64,
}

impl Scene {
    /// Re-locate a primitive by logical key after a rebuild.
    pub fn find_run(&self, key: &PartRef) -> Option<&TextRunPrimitive> {
        self.visuals
            .iter()
            .find(|v| v.section == key.section)
            .and_then(|v| v.runs.iter().find(|r| r.field == key.field))
    }

    fn find_run_mut(&mut self, key: &PartRef) -> Option<&mut TextRunPrimitive> {
        self.visuals
            .iter_mut()
            .find(|v| v.section == key.section)
            .and_then(|v| v.runs.iter_mut().find(|r| r.field == key.field))
    }

    /// Reapply selection decoration to the new primitive instance. Returns
    /// false when the key no longer resolves (section or part gone).
    pub fn decorate_selected(&mut self, key: &PartRef) -> bool {
        match self.find_run_mut(key) {
            Some(run) => {
                run.selected = true;
                true
            }
            None => false,
        }
    }

    /// Reapply hover decoration. Returns false when the key is gone.
    pub fn decorate_hovered(&mut self, key: &PartRef) -> bool {
        match self.find_run_mut(key) {
            Some(run) => {
                run.hovered = true;
                true
            }
            None => false,
        }
    }

    /// Strip all selection/hover decoration before reapplying the current
    /// controller state.
    pub fn clear_decorations(&mut self) {
        for visual in &mut self.visuals {
            for run in &mut visual.runs {
                run.selected = false;
                run.hovered = false;
            }
        }
    }

    /// Resolve the precise part under the pointer: hit regions gate the
    /// search, but the answer comes from per-run point-in-rect tests — a
    /// group may contain several parts.
    pub fn hit_test(&self, point: Point) -> Option<PartRef> {
        // Topmost section wins; visuals render in list order.
        for visual in self.visuals.iter().rev() {
            if !visual.hit_region.contains(point) {
                continue;
            }
            for run in &visual.runs {
                if run.bounds.contains(point) {
                    return Some(run.logical_key());
                }
            }
        }
        None
    }

    /// The section (if any) whose hit region contains the pointer.
    pub fn hit_section(&self, point: Point) -> Option<SectionId> {
        self.visuals
            .iter()
            .rev()
            .find(|v| v.hit_region.contains(point))
            .map(|v| v.section)
    }
}

/// Pure scene builder: immutable description in, primitives out.
#[derive(Debug, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Build a fresh scene from the current store state. Hidden sections
    /// produce no visuals.
    pub fn build(&self, store: &DocumentStore, engine: &ReflowEngine) -> Scene {
        let margins = store.margins();
        let mut visuals = Vec::new();

        for section in store.sections() {
            if !section.visible {
                continue;
            }

            let origin = doc_frame_to_render_origin(&section.frame, margins);
            let frame = Frame::new(origin.x, origin.y, section.frame.width, section.frame.height);

            let (runs, is_photo) = match &section.body {
                SectionBody::Photo { .. } => (Vec::new(), true),
                SectionBody::Fields { .. } => {
                    let layout = engine.stack(section, store);
                    let runs = layout
                        .slots
                        .into_iter()
                        .map(|slot| TextRunPrimitive {
                            section: section.id,
                            part_id: slot.part_id,
                            field: slot.field,
                            bounds: Frame::new(
                                origin.x + slot.x,
                                origin.y + slot.y,
                                slot.width,
                                slot.height,
                            ),
                            style: slot.style,
                            lines: slot.lines,
                            selected: false,
                            hovered: false,
                        })
                        .collect();
                    (runs, false)
                }
            };

            visuals.push(SectionVisual {
                section: section.id,
                hit_region: frame.inflated(HIT_REGION_SLOP),
                frame,
                runs,
                is_photo,
            });
        }

        Scene {
            visuals,
            version: store.version(),
        }
    }
}
