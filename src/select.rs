//! # Selection & Hover Controller
//!
//! A small state machine tracking which part the pointer is over and which
//! part is selected. State is keyed by logical field identity
//! (`(SectionId, FieldType)`), so it survives the renderer throwing away
//! and rebuilding every primitive.
//!
//! Invariant: hover decoration is never shown while a selection is active.

use crate::geometry::Point;
use crate::model::{FieldType, SectionId};
use crate::render::Scene;

/// Logical identity of a part, stable across rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartRef {
    pub section: SectionId,
    pub field: FieldType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Hovering(PartRef),
    Selected(PartRef),
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> Option<PartRef> {
        match self.state {
            SelectionState::Selected(part) => Some(part),
            _ => None,
        }
    }

    pub fn hovered(&self) -> Option<PartRef> {
        match self.state {
            SelectionState::Hovering(part) => Some(part),
            _ => None,
        }
    }

    /// Pointer moved. Hover only engages from `Idle`/`Hovering`; an active
    /// selection suppresses it entirely.
    pub fn pointer_moved(&mut self, scene: &Scene, point: Point) {
        match self.state {
            SelectionState::Selected(_) => {}
            SelectionState::Idle | SelectionState::Hovering(_) => {
                self.state = match scene.hit_test(point) {
                    Some(part) => SelectionState::Hovering(part),
                    None => SelectionState::Idle,
                };
            }
        }
    }

    /// Pointer released. A hit selects that part (implicitly clearing any
    /// prior selection); a miss on empty canvas clears the selection.
    pub fn pointer_released(&mut self, scene: &Scene, point: Point) {
        self.state = match scene.hit_test(point) {
            Some(part) => SelectionState::Selected(part),
            None => SelectionState::Idle,
        };
    }

    /// Explicit close (e.g. the style panel's close button).
    pub fn clear(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// After a rebuild, re-resolve the active state against the new scene by
    /// logical key and reapply decoration to the new primitive instances.
    /// A selected part whose section vanished drops back to `Idle`.
    pub fn rebind(&mut self, scene: &mut Scene) {
        match self.state {
            SelectionState::Idle => {}
            SelectionState::Hovering(part) => {
                if !scene.decorate_hovered(&part) {
                    self.state = SelectionState::Idle;
                }
            }
            SelectionState::Selected(part) => {
                if !scene.decorate_selected(&part) {
                    self.state = SelectionState::Idle;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Frame, Margins};
    use crate::layout::{ReflowConfig, ReflowEngine};
    use crate::model::{Category, PartSpec, SectionBodySpec, SectionSpec};
    use crate::render::Renderer;
    use crate::store::DocumentStore;
    use crate::style::TypographyTokens;

    fn scene_with_two_parts() -> (DocumentStore, ReflowEngine, Renderer, SectionId) {
        let mut store = DocumentStore::new(Margins::uniform(0.0), TypographyTokens::default());
        let id = store.add_section(SectionSpec {
            category: Category::Erfahrung,
            frame: Frame::new(0.0, 0.0, 300.0, 120.0),
            body: SectionBodySpec::Fields(vec![
                PartSpec::new(FieldType::Title, "Entwicklerin", 0),
                PartSpec::new(FieldType::Period, "2020 – 2024", 1).with_gap(8.0),
            ]),
            title: None,
            source_key: None,
        });
        (
            store,
            ReflowEngine::new(ReflowConfig::default()),
            Renderer::new(),
            id,
        )
    }

    fn point_in(scene: &Scene, field: FieldType) -> Point {
        let run = scene
            .visuals
            .iter()
            .flat_map(|v| &v.runs)
            .find(|r| r.field == field)
            .unwrap();
        Point::new(run.bounds.x + 1.0, run.bounds.y + 1.0)
    }

    #[test]
    fn test_hover_then_out() {
        let (store, engine, renderer, _) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();

        controller.pointer_moved(&scene, point_in(&scene, FieldType::Title));
        assert!(controller.hovered().is_some());

        controller.pointer_moved(&scene, Point::new(-50.0, -50.0));
        assert_eq!(controller.state(), SelectionState::Idle);
    }

    #[test]
    fn test_click_selects_and_suppresses_hover() {
        let (store, engine, renderer, id) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();

        controller.pointer_released(&scene, point_in(&scene, FieldType::Title));
        assert_eq!(
            controller.selected(),
            Some(PartRef {
                section: id,
                field: FieldType::Title
            })
        );

        // Moving over the other part must not surface hover while selected.
        controller.pointer_moved(&scene, point_in(&scene, FieldType::Period));
        assert!(controller.hovered().is_none());
        assert!(controller.selected().is_some());
    }

    #[test]
    fn test_click_other_part_switches_selection() {
        let (store, engine, renderer, _) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();

        controller.pointer_released(&scene, point_in(&scene, FieldType::Title));
        controller.pointer_released(&scene, point_in(&scene, FieldType::Period));
        assert_eq!(controller.selected().unwrap().field, FieldType::Period);
    }

    #[test]
    fn test_click_empty_canvas_clears() {
        let (store, engine, renderer, _) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();

        controller.pointer_released(&scene, point_in(&scene, FieldType::Title));
        controller.pointer_released(&scene, Point::new(-100.0, -100.0));
        assert_eq!(controller.state(), SelectionState::Idle);
    }

    #[test]
    fn test_rebind_survives_full_rebuild() {
        let (mut store, engine, renderer, id) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();
        controller.pointer_released(&scene, point_in(&scene, FieldType::Title));

        // A global style change forces a full re-render.
        store.set_global_field_style(
            Category::Erfahrung,
            FieldType::Title,
            &crate::style::PartStyle {
                font_weight: Some(700),
                ..Default::default()
            },
        );
        let mut rebuilt = renderer.build(&store, &engine);
        controller.rebind(&mut rebuilt);

        let selected = controller.selected().unwrap();
        assert_eq!(selected.section, id);
        assert_eq!(selected.field, FieldType::Title);
        assert!(rebuilt.find_run(&selected).unwrap().selected);
    }

    #[test]
    fn test_rebind_drops_selection_of_deleted_section() {
        let (mut store, engine, renderer, id) = scene_with_two_parts();
        let scene = renderer.build(&store, &engine);
        let mut controller = SelectionController::new();
        controller.pointer_released(&scene, point_in(&scene, FieldType::Title));

        store.delete_by_ids(&[id]);
        let mut rebuilt = renderer.build(&store, &engine);
        controller.rebind(&mut rebuilt);
        assert_eq!(controller.state(), SelectionState::Idle);
    }
}
