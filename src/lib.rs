//! # Entwurf
//!
//! A canvas section layout and reflow engine for a visual CV designer.
//!
//! A document is a flat list of movable, resizable **sections**, each
//! holding ordered text **parts**. The canvas reports moves and resizes as
//! center-anchored transforms; the engine bakes scale back into absolute
//! size, re-measures and re-stacks the text, and persists geometry in a
//! stable top-left, margin-relative coordinate space. Selection and hover
//! are tracked by logical field identity so they survive the renderer
//! rebuilding every primitive.
//!
//! ## Architecture
//!
//! ```text
//! Source CV data (JSON/API)
//!       ↓ debounced
//!   [mapping]  — source records → sections, matched by source key
//!       ↓
//!   [store]    — single source of truth: sections, styles, history, version
//!       ↓
//!   [render]   — rebuild primitives per version bump
//!       ↕
//!   [select]   — hover/selection by (section, field), not by primitive
//!       ↕
//!   [layout]   — resize → bake scale, re-measure, re-stack, write back
//!       ↓
//!   [snapshot] — save/load + pre-export checks
//! ```
//!
//! `layout` and `render` share one stacking routine
//! ([`layout::stack_parts`]), so the initial render and a post-resize
//! reflow agree bit for bit.

pub mod error;
pub mod geometry;
pub mod layout;
pub mod mapping;
pub mod model;
pub mod render;
pub mod select;
pub mod snapshot;
pub mod store;
pub mod style;
pub mod text;

use std::time::Instant;

use geometry::{Margins, Point};
use layout::{ReflowConfig, ReflowEngine, ReflowOutcome, ResizeEvent};
use mapping::{CvData, MapDefaults, RemapScheduler};
use render::{Renderer, Scene};
use select::SelectionController;
use store::DocumentStore;
use style::TypographyTokens;

/// The assembled designer: store, reflow engine, renderer, selection, and
/// the debounced mapping pipeline, wired the way the canvas adapter drives
/// them. Everything is also usable à la carte; this is the convenient
/// single-threaded front door.
pub struct Designer {
    store: DocumentStore,
    engine: ReflowEngine,
    renderer: Renderer,
    selection: SelectionController,
    scheduler: RemapScheduler,
    map_defaults: MapDefaults,
    scene: Scene,
}

impl Designer {
    pub fn new(margins: Margins, tokens: TypographyTokens) -> Self {
        let store = DocumentStore::new(margins, tokens);
        let engine = ReflowEngine::new(ReflowConfig::default());
        let renderer = Renderer::new();
        let scene = renderer.build(&store, &engine);
        Self {
            store,
            engine,
            renderer,
            selection: SelectionController::new(),
            scheduler: RemapScheduler::default(),
            map_defaults: MapDefaults::default(),
            scene,
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    /// Rebuild the scene if the store moved past it, then re-resolve
    /// selection and hover against the new primitives.
    pub fn sync_scene(&mut self) {
        if self.scene.version != self.store.version() {
            self.scene = self.renderer.build(&self.store, &self.engine);
        } else {
            self.scene.clear_decorations();
        }
        self.selection.rebind(&mut self.scene);
    }

    /// A new source-data snapshot arrived; (re)start the debounce window.
    pub fn source_data_changed(&mut self, data: CvData, now: Instant) {
        self.scheduler.schedule(data, now);
    }

    /// Drive the debounced pipeline. Fires at most one due re-mapping pass.
    pub fn tick(&mut self, now: Instant) {
        if let Some(data) = self.scheduler.poll(now) {
            mapping::remap(&mut self.store, &data, &self.map_defaults);
            self.sync_scene();
        }
    }

    /// Resize/move-end from the canvas: reflow, persist, re-render.
    pub fn resize_section(&mut self, event: ResizeEvent) -> ReflowOutcome {
        let outcome = self.engine.resize(&mut self.store, event);
        self.sync_scene();
        outcome
    }

    pub fn pointer_moved(&mut self, point: Point) {
        self.selection.pointer_moved(&self.scene, point);
        self.scene.clear_decorations();
        self.selection.rebind(&mut self.scene);
    }

    pub fn pointer_released(&mut self, point: Point) {
        self.selection.pointer_released(&self.scene, point);
        self.scene.clear_decorations();
        self.selection.rebind(&mut self.scene);
    }

    pub fn undo(&mut self) {
        self.store.undo();
        self.sync_scene();
    }

    pub fn redo(&mut self) {
        self.store.redo();
        self.sync_scene();
    }
}
