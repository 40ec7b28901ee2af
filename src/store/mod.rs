//! # Document Store
//!
//! The single source of truth for the designed document. Owns the section
//! list, the style tables, the margins, the history stacks, and a version
//! counter. Every committed mutation bumps the version and notifies
//! subscribed listeners; the renderer rebuilds whenever the version moves.
//!
//! The store is an explicit value that callers hold and pass by reference —
//! there is no ambient singleton. Mutations on unknown ids are silently
//! ignored (logged at debug level): the mapping layer runs asynchronously
//! relative to user edits, and a command racing a deletion is expected, not
//! an error.

pub mod history;

use crate::geometry::{FramePatch, Margins};
use crate::model::{
    Category, FieldType, Part, PartId, Section, SectionBody, SectionBodySpec, SectionId,
    SectionSpec,
};
use crate::style::{GlobalStyles, PartStyle, TypographyTokens};
use history::History;
use tracing::debug;

/// Who is writing a part's text. User edits lock the part against future
/// sync passes; sync writes skip locked parts and never set the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    User,
    Sync,
}

/// Listener invoked with the new version after each committed mutation.
pub type Listener = Box<dyn Fn(u64)>;

pub struct DocumentStore {
    sections: Vec<Section>,
    margins: Margins,
    tokens: TypographyTokens,
    global_styles: GlobalStyles,
    selected: Vec<SectionId>,
    history: History,
    version: u64,
    next_section_id: u64,
    next_part_id: u64,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("sections", &self.sections.len())
            .field("version", &self.version)
            .finish()
    }
}

impl DocumentStore {
    pub fn new(margins: Margins, tokens: TypographyTokens) -> Self {
        Self {
            sections: Vec::new(),
            margins,
            tokens,
            global_styles: GlobalStyles::new(),
            selected: Vec::new(),
            history: History::new(),
            version: 0,
            next_section_id: 1,
            next_part_id: 1,
            listeners: Vec::new(),
        }
    }

    // ── Read access ─────────────────────────────────────────────

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn margins(&self) -> &Margins {
        &self.margins
    }

    pub fn tokens(&self) -> &TypographyTokens {
        &self.tokens
    }

    pub fn global_styles(&self) -> &GlobalStyles {
        &self.global_styles
    }

    pub fn selected_sections(&self) -> &[SectionId] {
        &self.selected
    }

    /// Monotonic counter; moves on every committed mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a re-render trigger. Listeners run synchronously after each
    /// commit and must not mutate the store re-entrantly; defer instead.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn commit(&mut self) {
        self.version += 1;
        for listener in &self.listeners {
            listener(self.version);
        }
    }

    // ── Commands ────────────────────────────────────────────────

    /// Replace the full section list (mapping pass, snapshot load).
    pub fn set_sections(&mut self, sections: Vec<Section>) {
        // Keep id allocation ahead of whatever was loaded.
        for section in &sections {
            self.next_section_id = self.next_section_id.max(section.id.0 + 1);
            for part in section.body.parts() {
                self.next_part_id = self.next_part_id.max(part.id.0 + 1);
            }
        }
        self.sections = sections;
        self.selected.clear();
        self.commit();
    }

    /// Insert a new section with fresh ids and return its id.
    pub fn add_section(&mut self, spec: SectionSpec) -> SectionId {
        let id = SectionId(self.next_section_id);
        self.next_section_id += 1;

        let body = match spec.body {
            SectionBodySpec::Photo { aspect_ratio } => SectionBody::Photo { aspect_ratio },
            SectionBodySpec::Fields(part_specs) => SectionBody::Fields {
                parts: part_specs
                    .into_iter()
                    .map(|p| {
                        let pid = PartId(self.next_part_id);
                        self.next_part_id += 1;
                        Part {
                            id: pid,
                            field: p.field,
                            text: p.text,
                            indent: p.indent,
                            gap_before: p.gap_before,
                            width: None,
                            style: p.style,
                            order: p.order,
                            locked: false,
                        }
                    })
                    .collect(),
            },
        };

        self.sections.push(Section {
            id,
            category: spec.category,
            frame: spec.frame,
            body,
            visible: true,
            locked: false,
            title: spec.title,
            source_key: spec.source_key,
        });
        self.commit();
        id
    }

    /// Append one part to a fields section, allocating its id. No-op on
    /// unknown ids and on photo sections. Used by the mapping layer when a
    /// re-mapped source entity gained entries.
    pub fn append_part(&mut self, section_id: SectionId, spec: crate::model::PartSpec) {
        let next_id = PartId(self.next_part_id);
        let Some(parts) = self
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .and_then(|s| s.body.parts_mut())
        else {
            debug!(section = section_id.0, "append_part on unknown or photo section ignored");
            return;
        };
        self.next_part_id += 1;
        parts.push(Part {
            id: next_id,
            field: spec.field,
            text: spec.text,
            indent: spec.indent,
            gap_before: spec.gap_before,
            width: None,
            style: spec.style,
            order: spec.order,
            locked: false,
        });
        self.commit();
    }

    /// Merge partial frame fields. No-op on unknown id.
    pub fn update_frame(&mut self, id: SectionId, patch: FramePatch) {
        match self.sections.iter_mut().find(|s| s.id == id) {
            Some(section) => {
                patch.apply_to(&mut section.frame);
                self.commit();
            }
            None => debug!(section = id.0, "update_frame on unknown section ignored"),
        }
    }

    /// Replace the text of the part with the given field type.
    ///
    /// `TextOrigin::User` marks the part as locked (it survives re-mapping);
    /// `TextOrigin::Sync` skips parts that are already locked. No-op when
    /// the section or field is absent.
    pub fn update_part_text(
        &mut self,
        section_id: SectionId,
        field: FieldType,
        text: impl Into<String>,
        origin: TextOrigin,
    ) {
        let Some(section) = self.sections.iter_mut().find(|s| s.id == section_id) else {
            debug!(section = section_id.0, "update_part_text on unknown section ignored");
            return;
        };
        let Some(part) = section
            .body
            .parts_mut()
            .and_then(|parts| parts.iter_mut().find(|p| p.field == field))
        else {
            debug!(section = section_id.0, ?field, "update_part_text on absent part ignored");
            return;
        };
        if origin == TextOrigin::Sync && part.locked {
            debug!(section = section_id.0, ?field, "sync write skipped, part locked by user edit");
            return;
        }
        part.text = text.into();
        if origin == TextOrigin::User {
            part.locked = true;
        }
        self.commit();
    }

    /// Positional text sync for repeated fields: each entry addresses a part
    /// by `(section, order index)`. Locked parts are skipped; unknown
    /// targets are ignored. One commit for the whole batch.
    pub fn sync_bullets(&mut self, syncs: Vec<(SectionId, u32, String)>) {
        let mut changed = false;
        for (section_id, order, text) in syncs {
            let Some(part) = self
                .sections
                .iter_mut()
                .find(|s| s.id == section_id)
                .and_then(|s| s.body.parts_mut())
                .and_then(|parts| parts.iter_mut().find(|p| p.order == order))
            else {
                debug!(section = section_id.0, order, "bullet sync target missing, ignored");
                continue;
            };
            if part.locked {
                continue;
            }
            if part.text != text {
                part.text = text;
                changed = true;
            }
        }
        if changed {
            self.commit();
        }
    }

    /// Merge a style patch onto one part's local override.
    pub fn update_part_style_local(
        &mut self,
        section_id: SectionId,
        field: FieldType,
        patch: &PartStyle,
    ) {
        let Some(part) = self
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .and_then(|s| s.body.parts_mut())
            .and_then(|parts| parts.iter_mut().find(|p| p.field == field))
        else {
            debug!(section = section_id.0, ?field, "update_part_style_local on unknown target ignored");
            return;
        };
        part.style.merge(patch);
        self.commit();
    }

    /// Merge into the global style table for `(category, field)`. Affects
    /// every matching part without a local override for the patched
    /// attributes, through the cascade — no per-part mutation happens.
    pub fn set_global_field_style(&mut self, category: Category, field: FieldType, patch: &PartStyle) {
        self.global_styles.merge(category, field, patch);
        self.commit();
    }

    pub fn select_sections(&mut self, ids: Vec<SectionId>) {
        self.selected = ids;
        self.commit();
    }

    pub fn clear_section_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.commit();
        }
    }

    /// Remove the given sections and clear the selection.
    pub fn delete_by_ids(&mut self, ids: &[SectionId]) {
        let before = self.sections.len();
        self.sections.retain(|s| !ids.contains(&s.id));
        self.selected.clear();
        if self.sections.len() != before {
            self.commit();
        }
    }

    /// Remove all currently selected sections.
    pub fn delete_selected(&mut self) {
        let ids = self.selected.clone();
        self.delete_by_ids(&ids);
    }

    // ── History ─────────────────────────────────────────────────

    /// Record an undo point. Call before a mutation that should be undoable.
    pub fn snapshot(&mut self) {
        self.history.record(&self.sections);
    }

    /// Restore the previous snapshot; no-op if there is none.
    pub fn undo(&mut self) {
        if let Some(restored) = self.history.undo(&self.sections) {
            self.sections = restored;
            self.prune_selection();
            self.commit();
        }
    }

    /// Re-apply the last undone snapshot; no-op if there is none.
    pub fn redo(&mut self) {
        if let Some(restored) = self.history.redo(&self.sections) {
            self.sections = restored;
            self.prune_selection();
            self.commit();
        }
    }

    fn prune_selection(&mut self) {
        let live: Vec<SectionId> = self.sections.iter().map(|s| s.id).collect();
        self.selected.retain(|id| live.contains(id));
    }

    // ── Snapshot-load support ───────────────────────────────────

    /// Restore state from a persisted snapshot (see [`crate::snapshot`]).
    pub fn restore(
        &mut self,
        sections: Vec<Section>,
        margins: Margins,
        tokens: TypographyTokens,
        global_styles: GlobalStyles,
    ) {
        self.margins = margins;
        self.tokens = tokens;
        self.global_styles = global_styles;
        self.set_sections(sections);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::model::PartSpec;
    use std::cell::Cell;
    use std::rc::Rc;

    fn store() -> DocumentStore {
        DocumentStore::new(Margins::uniform(36.0), TypographyTokens::default())
    }

    fn simple_spec() -> SectionSpec {
        SectionSpec {
            category: Category::Erfahrung,
            frame: Frame::new(0.0, 0.0, 200.0, 80.0),
            body: SectionBodySpec::Fields(vec![
                PartSpec::new(FieldType::Title, "Entwicklerin", 0),
                PartSpec::new(FieldType::Company, "ACME GmbH", 1),
            ]),
            title: None,
            source_key: Some("experience:1".to_string()),
        }
    }

    #[test]
    fn test_every_mutation_bumps_version() {
        let mut store = store();
        let v0 = store.version();
        let id = store.add_section(simple_spec());
        assert!(store.version() > v0);

        let v1 = store.version();
        store.update_frame(id, FramePatch::position(10.0, 10.0));
        assert!(store.version() > v1);
    }

    #[test]
    fn test_unknown_id_is_silently_ignored() {
        let mut store = store();
        store.add_section(simple_spec());
        let v = store.version();
        store.update_frame(SectionId(999), FramePatch::position(1.0, 1.0));
        store.update_part_text(SectionId(999), FieldType::Title, "x", TextOrigin::User);
        assert_eq!(store.version(), v);
    }

    #[test]
    fn test_user_edit_locks_part_and_sync_respects_it() {
        let mut store = store();
        let id = store.add_section(simple_spec());

        store.update_part_text(id, FieldType::Title, "Senior Entwicklerin", TextOrigin::User);
        let part = store.section(id).unwrap().find_part(FieldType::Title).unwrap();
        assert!(part.locked);
        assert_eq!(part.text, "Senior Entwicklerin");

        store.update_part_text(id, FieldType::Title, "from sync", TextOrigin::Sync);
        let part = store.section(id).unwrap().find_part(FieldType::Title).unwrap();
        assert_eq!(part.text, "Senior Entwicklerin");

        // Unlocked parts do take sync writes, without gaining the lock.
        store.update_part_text(id, FieldType::Company, "New Corp", TextOrigin::Sync);
        let part = store.section(id).unwrap().find_part(FieldType::Company).unwrap();
        assert_eq!(part.text, "New Corp");
        assert!(!part.locked);
    }

    #[test]
    fn test_listeners_see_new_version() {
        let mut store = store();
        let seen = Rc::new(Cell::new(0u64));
        let seen2 = Rc::clone(&seen);
        store.subscribe(Box::new(move |v| seen2.set(v)));
        store.add_section(simple_spec());
        assert_eq!(seen.get(), store.version());
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut store = store();
        let a = store.add_section(simple_spec());
        let b = store.add_section(simple_spec());
        store.select_sections(vec![a]);
        store.delete_selected();
        assert!(store.selected_sections().is_empty());
        assert!(store.section(a).is_none());
        assert!(store.section(b).is_some());
    }

    #[test]
    fn test_undo_redo_restore_lists() {
        let mut store = store();
        let initial_len = store.sections().len();

        for _ in 0..3 {
            store.snapshot();
            store.add_section(simple_spec());
        }
        assert_eq!(store.sections().len(), initial_len + 3);

        for _ in 0..3 {
            store.undo();
        }
        assert_eq!(store.sections().len(), initial_len);

        for _ in 0..3 {
            store.redo();
        }
        assert_eq!(store.sections().len(), initial_len + 3);
    }

    #[test]
    fn test_set_sections_keeps_id_allocation_fresh() {
        let mut store = store();
        let section = Section::fields(
            SectionId(41),
            Category::Profil,
            Frame::default(),
            vec![],
        );
        store.set_sections(vec![section]);
        let new_id = store.add_section(simple_spec());
        assert!(new_id.0 > 41);
    }
}
