//! Snapshot-based undo/redo over the section list.
//!
//! Snapshotting is opt-in: callers record a snapshot before a mutation they
//! want undoable. High-frequency events (drag-move) deliberately don't
//! snapshot every intermediate state.

use crate::model::Section;

/// Maximum retained undo depth; the oldest snapshot is dropped beyond this.
const MAX_DEPTH: usize = 50;

#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Vec<Section>>,
    redo: Vec<Vec<Section>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current list as an undo point. Clears the redo stack —
    /// a new edit forks the timeline.
    pub fn record(&mut self, current: &[Section]) {
        self.undo.push(current.to_vec());
        if self.undo.len() > MAX_DEPTH {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    /// Pop the last snapshot, pushing `current` onto the redo stack.
    /// Returns `None` (no-op) when the undo stack is empty.
    pub fn undo(&mut self, current: &[Section]) -> Option<Vec<Section>> {
        let restored = self.undo.pop()?;
        self.redo.push(current.to_vec());
        Some(restored)
    }

    /// Symmetric to [`History::undo`].
    pub fn redo(&mut self, current: &[Section]) -> Option<Vec<Section>> {
        let restored = self.redo.pop()?;
        self.undo.push(current.to_vec());
        Some(restored)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
