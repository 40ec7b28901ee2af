//! # Source Mapping
//!
//! Converts external CV records (personal data, experience, education) into
//! sections and keeps an existing document in sync when the records change.
//!
//! Matching is by stable source key (`experience:<id>`, `education:<id>`,
//! `personal`, `kontakt`, `photo`). A re-mapping pass only *creates* and
//! *updates* — sections whose source entity disappeared are kept; deletion
//! is always an explicit user command. Text sync goes through the store's
//! `TextOrigin::Sync` path, so user-locked parts survive untouched.
//!
//! Re-mapping is debounced: source edits arrive on every keystroke, and
//! [`RemapScheduler`] is the explicit cancellable delayed task that keeps
//! the pipeline from thrashing.

use crate::geometry::Frame;
use crate::layout::BULLET_INDENT;
use crate::model::{Category, FieldType, PartSpec, SectionBodySpec, SectionId, SectionSpec};
use crate::store::{DocumentStore, TextOrigin};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

// ── External records ────────────────────────────────────────────

/// The source CV data as the surrounding application supplies it. Every
/// field is defensively defaulted — a malformed or partial record maps to
/// empty content, never to an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    pub personal: PersonalData,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalData {
    pub name: String,
    pub profession: String,
    pub summary: String,
    pub phone: String,
    pub email: String,
    /// height / width of the applicant photo, when one exists.
    pub photo_aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceEntry {
    pub id: u64,
    pub position: String,
    pub company: String,
    pub period: String,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub id: u64,
    pub degree: String,
    pub institution: String,
    pub period: String,
}

// ── Source keys ─────────────────────────────────────────────────

pub fn experience_key(id: u64) -> String {
    format!("experience:{id}")
}

pub fn education_key(id: u64) -> String {
    format!("education:{id}")
}

pub const PERSONAL_KEY: &str = "personal";
pub const KONTAKT_KEY: &str = "kontakt";
pub const PHOTO_KEY: &str = "photo";

// ── Mapping ─────────────────────────────────────────────────────

/// Placement defaults for sections created by a mapping pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDefaults {
    pub section_width: f64,
    pub section_height: f64,
    /// Vertical gap between newly placed sections.
    pub stack_gap: f64,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            section_width: 320.0,
            section_height: 60.0,
            stack_gap: 12.0,
        }
    }
}

/// The texts a source entity contributes, in field order. Bullets repeat.
fn desired_parts(section_key: &str, data: &CvData) -> Option<Vec<(FieldType, String)>> {
    if section_key == PERSONAL_KEY {
        let p = &data.personal;
        return Some(vec![
            (FieldType::Heading, p.name.clone()),
            (FieldType::Label, p.profession.clone()),
            (FieldType::Value, p.summary.clone()),
        ]);
    }
    if section_key == KONTAKT_KEY {
        let p = &data.personal;
        return Some(vec![
            (FieldType::Label, p.phone.clone()),
            (FieldType::Value, p.email.clone()),
        ]);
    }
    if let Some(id) = section_key.strip_prefix("experience:") {
        let id: u64 = id.parse().ok()?;
        let entry = data.experience.iter().find(|e| e.id == id)?;
        let mut parts = vec![
            (FieldType::Title, entry.position.clone()),
            (FieldType::Company, entry.company.clone()),
            (FieldType::Period, entry.period.clone()),
        ];
        parts.extend(entry.tasks.iter().map(|t| (FieldType::Bullet, t.clone())));
        return Some(parts);
    }
    if let Some(id) = section_key.strip_prefix("education:") {
        let id: u64 = id.parse().ok()?;
        let entry = data.education.iter().find(|e| e.id == id)?;
        return Some(vec![
            (FieldType::Title, entry.degree.clone()),
            (FieldType::Company, entry.institution.clone()),
            (FieldType::Period, entry.period.clone()),
        ]);
    }
    None
}

fn part_specs(parts: &[(FieldType, String)]) -> Vec<PartSpec> {
    parts
        .iter()
        .enumerate()
        .map(|(i, (field, text))| {
            let mut spec = PartSpec::new(*field, text.clone(), i as u32);
            if *field == FieldType::Bullet {
                spec = spec.with_indent(BULLET_INDENT).with_gap(4.0);
            } else if i > 0 {
                spec = spec.with_gap(2.0);
            }
            spec
        })
        .collect()
}

/// Run a mapping pass against the store: update matched sections in place,
/// create sections for unmatched source keys, keep everything else.
/// Returns the ids of newly created sections.
pub fn remap(store: &mut DocumentStore, data: &CvData, defaults: &MapDefaults) -> Vec<SectionId> {
    // Phase 1: sync texts into existing sections, honoring part locks.
    // Collected first so the borrow of the section list ends before the
    // store commands run.
    let mut updates: Vec<(SectionId, FieldType, String)> = Vec::new();
    let mut appends: Vec<(SectionId, PartSpec)> = Vec::new();

    for section in store.sections() {
        let Some(key) = section.source_key.as_deref() else {
            continue;
        };
        let Some(desired) = desired_parts(key, data) else {
            // Photo sections carry no text parts; for anything else the
            // source entity vanished and the section is kept as-is.
            if key != PHOTO_KEY {
                debug!(key, "source entity missing; section kept");
            }
            continue;
        };

        // Unique fields go through the field-keyed command. Bullets repeat
        // per section, so they sync positionally (collect_bullet_syncs) and
        // surplus source tasks become appended parts.
        let mut bullet_cursor = 0usize;
        let existing_bullets = section
            .body
            .parts()
            .iter()
            .filter(|p| p.field == FieldType::Bullet)
            .count();
        let mut next_order = section
            .body
            .parts()
            .iter()
            .map(|p| p.order + 1)
            .max()
            .unwrap_or(0);

        for (field, text) in &desired {
            if *field == FieldType::Bullet {
                if bullet_cursor < existing_bullets {
                    bullet_cursor += 1;
                } else {
                    appends.push((
                        section.id,
                        PartSpec::new(FieldType::Bullet, text.clone(), next_order)
                            .with_indent(BULLET_INDENT)
                            .with_gap(4.0),
                    ));
                    next_order += 1;
                }
            } else {
                updates.push((section.id, *field, text.clone()));
            }
        }
    }

    let bullet_syncs = collect_bullet_syncs(store, data);

    for (id, field, text) in updates {
        store.update_part_text(id, field, text, TextOrigin::Sync);
    }
    store.sync_bullets(bullet_syncs);
    for (id, spec) in appends {
        store.append_part(id, spec);
    }

    // Phase 2: create sections for source keys with no section yet.
    let existing_keys: Vec<String> = store
        .sections()
        .iter()
        .filter_map(|s| s.source_key.clone())
        .collect();
    let mut created = Vec::new();
    let mut cursor_y = store
        .sections()
        .iter()
        .map(|s| s.frame.y + s.frame.height)
        .fold(0.0f64, f64::max);

    let mut create = |store: &mut DocumentStore, key: String, category: Category, body: SectionBodySpec, cursor_y: &mut f64| {
        let height = defaults.section_height;
        let spec = SectionSpec {
            category,
            frame: Frame::new(0.0, *cursor_y + defaults.stack_gap, defaults.section_width, height),
            body,
            title: None,
            source_key: Some(key),
        };
        *cursor_y += defaults.stack_gap + height;
        store.add_section(spec)
    };

    let mut wanted: Vec<(String, Category, SectionBodySpec)> = Vec::new();
    wanted.push((
        PERSONAL_KEY.to_string(),
        Category::Profil,
        SectionBodySpec::Fields(part_specs(&desired_parts(PERSONAL_KEY, data).unwrap_or_default())),
    ));
    wanted.push((
        KONTAKT_KEY.to_string(),
        Category::Kontakt,
        SectionBodySpec::Fields(part_specs(&desired_parts(KONTAKT_KEY, data).unwrap_or_default())),
    ));
    if let Some(aspect_ratio) = data.personal.photo_aspect_ratio {
        wanted.push((
            PHOTO_KEY.to_string(),
            Category::Profil,
            SectionBodySpec::Photo { aspect_ratio },
        ));
    }
    for entry in &data.experience {
        let key = experience_key(entry.id);
        let parts = desired_parts(&key, data).unwrap_or_default();
        wanted.push((key, Category::Erfahrung, SectionBodySpec::Fields(part_specs(&parts))));
    }
    for entry in &data.education {
        let key = education_key(entry.id);
        let parts = desired_parts(&key, data).unwrap_or_default();
        wanted.push((key, Category::Ausbildung, SectionBodySpec::Fields(part_specs(&parts))));
    }

    for (key, category, body) in wanted {
        if !existing_keys.iter().any(|k| k == &key) {
            created.push(create(store, key, category, body, &mut cursor_y));
        }
    }

    created
}

/// Positional bullet sync plan: `(section, part order index, new text)`.
fn collect_bullet_syncs(store: &DocumentStore, data: &CvData) -> Vec<(SectionId, u32, String)> {
    let mut syncs = Vec::new();
    for section in store.sections() {
        let Some(key) = section.source_key.as_deref() else {
            continue;
        };
        let Some(desired) = desired_parts(key, data) else {
            continue;
        };
        let desired_bullets: Vec<&String> = desired
            .iter()
            .filter(|(f, _)| *f == FieldType::Bullet)
            .map(|(_, t)| t)
            .collect();
        let bullets: Vec<(u32, bool)> = section
            .ordered_parts()
            .iter()
            .filter(|p| p.field == FieldType::Bullet)
            .map(|p| (p.order, p.locked))
            .collect();
        for ((order, locked), text) in bullets.iter().zip(desired_bullets) {
            if !locked {
                syncs.push((section.id, *order, text.clone()));
            }
        }
    }
    syncs
}

// ── Debounce ────────────────────────────────────────────────────

/// Default debounce window for re-mapping after a source-data change.
pub const REMAP_DEBOUNCE: Duration = Duration::from_millis(200);

/// An explicit cancellable delayed task. Each new source snapshot replaces
/// the pending one and restarts the timer; nothing runs until [`Self::poll`]
/// observes the deadline passing. Last write wins.
#[derive(Debug)]
pub struct RemapScheduler {
    delay: Duration,
    pending: Option<(CvData, Instant)>,
}

impl RemapScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Cancel any pending task and schedule `data` for `now + delay`.
    pub fn schedule(&mut self, data: CvData, now: Instant) {
        self.pending = Some((data, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending snapshot if its deadline has passed. Fires at most
    /// once per scheduled snapshot.
    pub fn poll(&mut self, now: Instant) -> Option<CvData> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(data, _)| data),
            _ => None,
        }
    }
}

impl Default for RemapScheduler {
    fn default() -> Self {
        Self::new(REMAP_DEBOUNCE)
    }
}
