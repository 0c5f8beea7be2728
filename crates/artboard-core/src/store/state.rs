//! Editor state and read-only selectors.

use crate::canvas::CanvasView;
use crate::shapes::{ShapeId, ShapeKind, ShapeRecord};
use crate::tools::{PanelState, ToolState};
use kurbo::{Point, Rect};
use std::collections::HashSet;
use std::sync::Arc;

/// The whole editor document plus UI slices.
///
/// Every slice sits behind an `Arc`; reducers replace only the slices they
/// touch, and inside `shapes` only the records they touch.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    /// Shapes in paint order (back to front).
    pub shapes: Arc<Vec<Arc<ShapeRecord>>>,
    pub canvas: Arc<CanvasView>,
    pub tool: Arc<ToolState>,
    pub panels: Arc<PanelState>,
}

impl EditorState {
    /// Empty document with the default canvas, tool and panels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shapes, groups included.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True when the document has no shapes.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shapes in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeRecord> {
        self.shapes.iter().map(|s| s.as_ref())
    }

    /// Look up a shape by id.
    pub fn shape(&self, id: &ShapeId) -> Option<&ShapeRecord> {
        self.iter().find(|s| &s.id == id)
    }

    /// Position in paint order (the exported `zIndex`).
    pub fn index_of(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| &s.id == id)
    }

    /// True when a shape with `id` exists.
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.index_of(id).is_some()
    }

    /// Selected ids in the order they were selected.
    pub fn selected_ids(&self) -> &[ShapeId] {
        &self.tool.selected_ids
    }

    /// Selected shapes in selection order.
    pub fn selected_shapes(&self) -> Vec<&ShapeRecord> {
        self.tool
            .selected_ids
            .iter()
            .filter_map(|id| self.shape(id))
            .collect()
    }

    /// Members of a group, in paint order.
    pub fn group_members(&self, group: &ShapeId) -> Vec<&ShapeRecord> {
        self.iter()
            .filter(|s| s.group_id.as_ref() == Some(group))
            .collect()
    }

    /// Ids nested under `group` at any depth, excluding `group` itself.
    pub fn descendants(&self, group: &ShapeId) -> HashSet<ShapeId> {
        descendants(&self.shapes, group)
    }

    /// Shapes hit at a world point, front-most first.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<&ShapeId> {
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.kind != ShapeKind::Group && s.hit_test(point, tolerance))
            .map(|s| &s.id)
            .collect()
    }

    /// Top-level pick: the front-most hit, resolved to its outermost group.
    pub fn pick(&self, point: Point, tolerance: f64) -> Option<ShapeId> {
        let mut id = self.shapes_at_point(point, tolerance).first().copied()?.clone();
        // Bounded walk: a malformed document could contain a membership cycle.
        for _ in 0..self.len() {
            match self.shape(&id).and_then(|s| s.group_id.clone()) {
                Some(parent) if self.contains(&parent) => id = parent,
                _ => break,
            }
        }
        Some(id)
    }

    /// Visible shapes whose bounds intersect `rect`, in paint order.
    pub fn shapes_in_rect(&self, rect: Rect) -> Vec<&ShapeId> {
        self.iter()
            .filter(|s| s.visible && s.kind != ShapeKind::Group)
            .filter(|s| overlaps(rect, s.bounds()))
            .map(|s| &s.id)
            .collect()
    }

    /// Union of all visible shape bounds.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.iter()
            .filter(|s| s.visible)
            .map(|s| s.bounds())
            .reduce(|acc, b| acc.union(b))
    }

    /// Union of bounds for the given ids.
    pub fn bounds_of(&self, ids: &[ShapeId]) -> Option<Rect> {
        ids.iter()
            .filter_map(|id| self.shape(id))
            .map(|s| s.bounds())
            .reduce(|acc, b| acc.union(b))
    }

    /// Check the document invariants: unique ids, and `is_selected` set
    /// exactly for ids in the tool selection.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::new();
        if !self.iter().all(|s| seen.insert(&s.id)) {
            return false;
        }
        let selected: HashSet<_> = self.tool.selected_ids.iter().collect();
        selected.len() == self.tool.selected_ids.len()
            && selected.iter().all(|id| seen.contains(id))
            && self.iter().all(|s| s.is_selected == selected.contains(&s.id))
    }
}

/// All ids nested under `group`, at any depth. A membership cycle cannot
/// loop: each id is visited once.
pub(crate) fn descendants(shapes: &[Arc<ShapeRecord>], group: &ShapeId) -> HashSet<ShapeId> {
    let mut found = HashSet::new();
    let mut frontier = vec![group.clone()];
    while let Some(parent) = frontier.pop() {
        for shape in shapes {
            if shape.group_id.as_ref() == Some(&parent) && found.insert(shape.id.clone()) {
                frontier.push(shape.id.clone());
            }
        }
    }
    found.remove(group);
    found
}

/// Closed-interval overlap, so zero-width lines still count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
