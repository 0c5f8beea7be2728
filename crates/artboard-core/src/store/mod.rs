//! Central editor store: state, reducer, subscriptions and history.

mod action;
mod reducer;
mod state;

pub use action::{Action, ReorderOp};
pub use reducer::{DUPLICATE_OFFSET, reduce};
pub use state::EditorState;

use crate::history::{DEFAULT_HISTORY_LIMIT, History};
use crate::shapes::{IdGenerator, ShapeId, TimestampIds};
use std::collections::HashSet;
use std::sync::Arc;

/// Handle returned by [`EditorStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&EditorState) + Send>;

/// Owns the editor state. Single writer: every change goes through
/// [`EditorStore::dispatch`] (or undo/redo).
pub struct EditorStore {
    state: EditorState,
    ids: Box<dyn IdGenerator + Send>,
    history: Option<History<EditorState>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorStore")
            .field("shapes", &self.state.len())
            .field("history", &self.history.as_ref().map(|h| h.undo_depth()))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EditorStore {
    /// Store with an empty document, timestamp ids and no history.
    pub fn new() -> Self {
        Self::with_state(EditorState::new())
    }

    /// Store over an existing state, without history.
    pub fn with_state(state: EditorState) -> Self {
        Self {
            state,
            ids: Box::new(TimestampIds),
            history: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Replace the id generator.
    pub fn with_ids(mut self, ids: impl IdGenerator + Send + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Track undo history, keeping at most `limit` steps.
    pub fn with_history(mut self, limit: usize) -> Self {
        self.history = Some(History::with_limit(self.state.clone(), limit));
        self
    }

    /// Track undo history with the default limit.
    pub fn with_default_history(self) -> Self {
        self.with_history(DEFAULT_HISTORY_LIMIT)
    }

    /// Current state.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// Undo history, if tracked.
    pub fn history(&self) -> Option<&History<EditorState>> {
        self.history.as_ref()
    }

    /// Run `action` through the reducer and notify subscribers. Undoable
    /// actions that leave the document unchanged record no history step.
    pub fn dispatch(&mut self, action: Action) -> &EditorState {
        log::debug!("dispatch: {}", action.name());
        let next = reduce(&self.state, &action, self.ids.as_mut());
        if action.is_undoable() {
            self.record(action.name(), &next);
        }
        self.set_state(next);
        &self.state
    }

    /// Dispatch several actions in order, each its own undo step.
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) -> &EditorState {
        for action in actions {
            self.dispatch(action);
        }
        &self.state
    }

    /// Dispatch `actions` as one edit: subscribers hear about the final
    /// state once and a single undo step reverts the whole batch.
    pub fn dispatch_batch(
        &mut self,
        label: &str,
        actions: impl IntoIterator<Item = Action>,
    ) -> &EditorState {
        let mut next = self.state.clone();
        let mut undoable = false;
        let mut count = 0;
        for action in actions {
            next = reduce(&next, &action, self.ids.as_mut());
            undoable |= action.is_undoable();
            count += 1;
        }
        log::debug!("dispatch batch: {} ({} actions)", label, count);
        if count == 0 {
            return &self.state;
        }
        if undoable {
            self.record(label, &next);
        }
        self.set_state(next);
        &self.state
    }

    /// Replace the state wholesale (e.g. after loading a document). History
    /// restarts from the new state.
    pub fn replace_state(&mut self, state: EditorState) {
        if let Some(history) = self.history.as_mut() {
            let limit = history.limit();
            *history = History::with_limit(state.clone(), limit);
        }
        self.set_state(state);
    }

    /// Undo the last document change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.as_mut().and_then(|h| h.undo().cloned()) else {
            return false;
        };
        log::debug!("undo");
        let next = restore_document(&self.state, &snapshot);
        self.set_state(next);
        true
    }

    /// Redo the last undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.as_mut().and_then(|h| h.redo().cloned()) else {
            return false;
        };
        log::debug!("redo");
        let next = restore_document(&self.state, &snapshot);
        self.set_state(next);
        true
    }

    /// True when there is a step to undo.
    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_undo())
    }

    /// True when there is a step to redo.
    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_redo())
    }

    /// Register a listener called after every state change.
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorState) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn record(&mut self, label: &str, next: &EditorState) {
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if document_changed(&self.state, next) {
            history.record(label, next.clone());
        }
    }

    fn set_state(&mut self, next: EditorState) {
        self.state = next;
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
    }
}

/// Shapes or canvas settings differ between `before` and `after`.
fn document_changed(before: &EditorState, after: &EditorState) -> bool {
    let same_shapes = Arc::ptr_eq(&before.shapes, &after.shapes) || before.shapes == after.shapes;
    let same_canvas = Arc::ptr_eq(&before.canvas, &after.canvas) || before.canvas == after.canvas;
    !(same_shapes && same_canvas)
}

/// Take shapes and artboard settings from `snapshot`; keep the current
/// pan/zoom, tool and panels, and re-stamp the selection against the
/// restored shapes.
fn restore_document(current: &EditorState, snapshot: &EditorState) -> EditorState {
    let selection: Vec<ShapeId> = current
        .tool
        .selected_ids
        .iter()
        .filter(|id| snapshot.contains(id))
        .cloned()
        .collect();
    let selected: HashSet<&ShapeId> = selection.iter().collect();
    let shapes = snapshot
        .shapes
        .iter()
        .map(|shape| {
            if shape.is_selected == selected.contains(&shape.id) {
                Arc::clone(shape)
            } else {
                let mut next = (**shape).clone();
                next.is_selected = !next.is_selected;
                Arc::new(next)
            }
        })
        .collect();
    let tool = if selection == current.tool.selected_ids {
        Arc::clone(&current.tool)
    } else {
        let mut tool = (*current.tool).clone();
        tool.selected_ids = selection;
        Arc::new(tool)
    };
    let mut canvas = (*snapshot.canvas).clone();
    canvas.offset = current.canvas.offset;
    canvas.zoom = current.canvas.zoom;
    let canvas = if canvas == *current.canvas {
        Arc::clone(&current.canvas)
    } else {
        Arc::new(canvas)
    };
    EditorState {
        shapes: Arc::new(shapes),
        canvas,
        tool,
        panels: Arc::clone(&current.panels),
    }
}
