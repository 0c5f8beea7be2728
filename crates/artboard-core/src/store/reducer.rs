//! The pure `(state, action) -> state` reducer.

use super::state::descendants;
use super::{Action, EditorState, ReorderOp};
use crate::shapes::{IdGenerator, ShapeId, ShapePatch, ShapeKind, ShapeRecord};
use crate::tools::{DrawingState, OpenPanel, ToolState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Offset applied to duplicated shapes.
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// Attempts at drawing a non-colliding id before falling back to a suffix.
const MAX_ID_ATTEMPTS: usize = 16;

type Shapes = Vec<Arc<ShapeRecord>>;

/// Apply `action` to `state`, returning the next state.
///
/// Slices the action does not address are shared with `state`; within the
/// shape list, untouched records are shared too.
pub fn reduce(state: &EditorState, action: &Action, ids: &mut dyn IdGenerator) -> EditorState {
    match action {
        Action::AddShape(record) => add_shape(state, record, ids),
        Action::UpdateShape { id, patch } => update_shape(state, id, patch),
        Action::DeleteShape(id) => delete_shapes(state, std::slice::from_ref(id)),
        Action::DeleteSelected => delete_shapes(state, &state.tool.selected_ids),
        Action::SelectShapes(selection) => select(state, selection),
        Action::DeselectAll => select(state, &[]),
        Action::SetTool(kind) => with_tool(state, |tool| {
            tool.active = *kind;
            tool.drawing = DrawingState::Idle;
        }),
        Action::UpdateCanvas(patch) => {
            let mut canvas = (*state.canvas).clone();
            canvas.apply(patch);
            EditorState {
                canvas: Arc::new(canvas),
                ..state.clone()
            }
        }
        Action::UpdateToolSettings(patch) => with_tool(state, |tool| tool.settings.apply(patch)),
        Action::OpenPanel { panel, position } => {
            let mut panels = (*state.panels).clone();
            panels.open.retain(|p| p.kind != *panel);
            panels.open.push(OpenPanel {
                kind: *panel,
                position: *position,
            });
            EditorState {
                panels: Arc::new(panels),
                ..state.clone()
            }
        }
        Action::ClosePanel(panel) => {
            if !state.panels.is_open(*panel) {
                return state.clone();
            }
            let mut panels = (*state.panels).clone();
            panels.open.retain(|p| p.kind != *panel);
            EditorState {
                panels: Arc::new(panels),
                ..state.clone()
            }
        }
        Action::SetDrawingState(drawing) => with_tool(state, |tool| tool.drawing = *drawing),
        Action::Reorder { id, op } => reorder(state, id, *op),
        Action::DuplicateShapes(targets) => duplicate(state, targets, ids),
        Action::GroupShapes(members) => group(state, members, ids),
        Action::Ungroup(id) => ungroup(state, id),
        Action::LoadShapes(records) => load(state, records, ids),
        Action::ClearCanvas => EditorState {
            shapes: Arc::new(Vec::new()),
            tool: clear_selection_tool(&state.tool),
            ..state.clone()
        },
    }
}

fn with_tool(state: &EditorState, f: impl FnOnce(&mut ToolState)) -> EditorState {
    let mut tool = (*state.tool).clone();
    f(&mut tool);
    EditorState {
        tool: Arc::new(tool),
        ..state.clone()
    }
}

fn clear_selection_tool(tool: &Arc<ToolState>) -> Arc<ToolState> {
    if tool.selected_ids.is_empty() {
        return Arc::clone(tool);
    }
    let mut next = (**tool).clone();
    next.selected_ids.clear();
    Arc::new(next)
}

/// Draw an id that is not in `taken`.
fn fresh_id(taken: &HashSet<ShapeId>, kind: ShapeKind, ids: &mut dyn IdGenerator) -> ShapeId {
    let mut candidate = ids.generate(kind);
    for _ in 0..MAX_ID_ATTEMPTS {
        if !taken.contains(&candidate) {
            return candidate;
        }
        candidate = ids.generate(kind);
    }
    let base = candidate.as_str().to_string();
    (1..)
        .map(|n| ShapeId::new(format!("{base}-{n}")))
        .find(|id| !taken.contains(id))
        .unwrap_or(candidate)
}

fn taken_ids(shapes: &[Arc<ShapeRecord>]) -> HashSet<ShapeId> {
    shapes.iter().map(|s| s.id.clone()).collect()
}

/// Stamp `is_selected` to match `selection`, sharing records whose flag
/// already matches.
fn stamp_selection(shapes: &[Arc<ShapeRecord>], selection: &HashSet<&ShapeId>) -> Shapes {
    shapes
        .iter()
        .map(|shape| {
            let selected = selection.contains(&shape.id);
            if shape.is_selected == selected {
                Arc::clone(shape)
            } else {
                let mut next = (**shape).clone();
                next.is_selected = selected;
                Arc::new(next)
            }
        })
        .collect()
}

/// Replace shapes and selection together, keeping the flags consistent.
fn with_shapes_and_selection(state: &EditorState, shapes: Shapes, selection: Vec<ShapeId>) -> EditorState {
    let selected: HashSet<&ShapeId> = selection.iter().collect();
    let shapes = stamp_selection(&shapes, &selected);
    let tool = if state.tool.selected_ids == selection {
        Arc::clone(&state.tool)
    } else {
        let mut tool = (*state.tool).clone();
        tool.selected_ids = selection;
        Arc::new(tool)
    };
    EditorState {
        shapes: Arc::new(shapes),
        tool,
        ..state.clone()
    }
}

fn add_shape(state: &EditorState, record: &ShapeRecord, ids: &mut dyn IdGenerator) -> EditorState {
    let id = fresh_id(&taken_ids(&state.shapes), record.kind, ids);
    let mut shape = record.clone();
    shape.id = id.clone();
    log::debug!("add {} {}", shape.kind, id);

    let mut shapes: Shapes = state.shapes.iter().cloned().collect();
    shapes.push(Arc::new(shape));
    with_shapes_and_selection(state, shapes, vec![id])
}

fn update_shape(state: &EditorState, id: &ShapeId, patch: &ShapePatch) -> EditorState {
    let Some(index) = state.index_of(id) else {
        return state.clone();
    };
    let current = &state.shapes[index];
    let mut next = (**current).clone();
    patch.apply(&mut next);
    next.id = current.id.clone();
    next.is_selected = current.is_selected;

    let (dx, dy) = (next.x - current.x, next.y - current.y);
    let moves_members = current.kind == ShapeKind::Group && (dx != 0.0 || dy != 0.0);

    let mut shapes: Shapes = state.shapes.iter().cloned().collect();
    shapes[index] = Arc::new(next);
    if moves_members {
        let members = descendants(&shapes, id);
        for shape in shapes.iter_mut() {
            if members.contains(&shape.id) {
                let mut moved = (**shape).clone();
                moved.translate(dx, dy);
                *shape = Arc::new(moved);
            }
        }
    }
    EditorState {
        shapes: Arc::new(shapes),
        ..state.clone()
    }
}

fn delete_shapes(state: &EditorState, targets: &[ShapeId]) -> EditorState {
    let mut doomed: HashSet<ShapeId> = HashSet::new();
    for id in targets.iter().filter(|id| state.contains(id)) {
        doomed.insert(id.clone());
        doomed.extend(descendants(&state.shapes, id));
    }
    if doomed.is_empty() {
        return state.clone();
    }

    // Groups left without members go too, repeatedly for nested groups.
    loop {
        let emptied: Vec<ShapeId> = state
            .iter()
            .filter(|s| s.kind == ShapeKind::Group && !doomed.contains(&s.id))
            .filter(|g| {
                let had_members = state.iter().any(|s| s.group_id.as_ref() == Some(&g.id));
                let has_members = state
                    .iter()
                    .any(|s| s.group_id.as_ref() == Some(&g.id) && !doomed.contains(&s.id));
                had_members && !has_members
            })
            .map(|g| g.id.clone())
            .collect();
        if emptied.is_empty() {
            break;
        }
        doomed.extend(emptied);
    }

    let shapes: Shapes = state
        .shapes
        .iter()
        .filter(|s| !doomed.contains(&s.id))
        .cloned()
        .collect();
    let selection: Vec<ShapeId> = state
        .tool
        .selected_ids
        .iter()
        .filter(|id| !doomed.contains(*id))
        .cloned()
        .collect();
    log::debug!("delete {} shape(s)", doomed.len());
    with_shapes_and_selection(state, shapes, selection)
}

fn select(state: &EditorState, requested: &[ShapeId]) -> EditorState {
    let mut seen = HashSet::new();
    let selection: Vec<ShapeId> = requested
        .iter()
        .filter(|id| state.contains(id) && seen.insert((*id).clone()))
        .cloned()
        .collect();
    with_shapes_and_selection(state, state.shapes.iter().cloned().collect(), selection)
}

fn reorder(state: &EditorState, id: &ShapeId, op: ReorderOp) -> EditorState {
    let Some(from) = state.index_of(id) else {
        return state.clone();
    };
    let last = state.len() - 1;
    let to = match op {
        ReorderOp::ToFront => last,
        ReorderOp::ToBack => 0,
        ReorderOp::Forward => (from + 1).min(last),
        ReorderOp::Backward => from.saturating_sub(1),
        ReorderOp::ToIndex(index) => index.min(last),
    };
    if to == from {
        return state.clone();
    }
    let mut shapes: Shapes = state.shapes.iter().cloned().collect();
    let shape = shapes.remove(from);
    shapes.insert(to, shape);
    EditorState {
        shapes: Arc::new(shapes),
        ..state.clone()
    }
}

fn duplicate(state: &EditorState, targets: &[ShapeId], ids: &mut dyn IdGenerator) -> EditorState {
    let requested: HashSet<&ShapeId> = targets.iter().collect();
    let mut included: HashSet<ShapeId> = HashSet::new();
    for id in targets.iter().filter(|id| state.contains(id)) {
        included.insert(id.clone());
        included.extend(descendants(&state.shapes, id));
    }
    if included.is_empty() {
        return state.clone();
    }

    let mut taken = taken_ids(&state.shapes);
    let mut remap: HashMap<ShapeId, ShapeId> = HashMap::new();
    for shape in state.iter().filter(|s| included.contains(&s.id)) {
        let id = fresh_id(&taken, shape.kind, ids);
        taken.insert(id.clone());
        remap.insert(shape.id.clone(), id);
    }

    let mut shapes: Shapes = state.shapes.iter().cloned().collect();
    let mut selection = Vec::new();
    for shape in state.iter().filter(|s| included.contains(&s.id)) {
        let mut copy = shape.clone();
        copy.id = remap[&shape.id].clone();
        copy.group_id = shape
            .group_id
            .as_ref()
            .map(|g| remap.get(g).cloned().unwrap_or_else(|| g.clone()));
        copy.translate(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        if requested.contains(&shape.id) {
            selection.push(copy.id.clone());
        }
        shapes.push(Arc::new(copy));
    }
    with_shapes_and_selection(state, shapes, selection)
}

fn group(state: &EditorState, members: &[ShapeId], ids: &mut dyn IdGenerator) -> EditorState {
    let mut seen = HashSet::new();
    let members: Vec<&ShapeId> = members
        .iter()
        .filter(|id| state.contains(id) && seen.insert((*id).clone()))
        .collect();
    if members.len() < 2 {
        return state.clone();
    }
    let member_ids: Vec<ShapeId> = members.iter().map(|id| (*id).clone()).collect();
    let Some(bounds) = state.bounds_of(&member_ids) else {
        return state.clone();
    };

    let group_id = fresh_id(&taken_ids(&state.shapes), ShapeKind::Group, ids);
    let mut record = ShapeRecord::group(bounds).with_id(group_id.clone());
    // A new group nests where its members lived, if they shared a parent.
    let parents: HashSet<Option<&ShapeId>> = members
        .iter()
        .filter_map(|id| state.shape(id))
        .map(|s| s.group_id.as_ref())
        .collect();
    if parents.len() == 1 {
        record.group_id = parents.into_iter().next().flatten().cloned();
    }

    let top = members
        .iter()
        .filter_map(|id| state.index_of(id))
        .max()
        .unwrap_or(0);
    let mut shapes: Shapes = Vec::with_capacity(state.len() + 1);
    for (index, shape) in state.shapes.iter().enumerate() {
        if seen.contains(&shape.id) {
            let mut member = (**shape).clone();
            member.group_id = Some(group_id.clone());
            shapes.push(Arc::new(member));
        } else {
            shapes.push(Arc::clone(shape));
        }
        if index == top {
            shapes.push(Arc::new(record.clone()));
        }
    }
    log::debug!("group {} shape(s) into {}", member_ids.len(), group_id);
    with_shapes_and_selection(state, shapes, vec![group_id])
}

fn ungroup(state: &EditorState, id: &ShapeId) -> EditorState {
    let Some(group) = state.shape(id).filter(|s| s.kind == ShapeKind::Group) else {
        return state.clone();
    };
    let parent = group.group_id.clone();
    let mut members = Vec::new();
    let shapes: Shapes = state
        .shapes
        .iter()
        .filter(|s| &s.id != id)
        .map(|s| {
            if s.group_id.as_ref() == Some(id) {
                members.push(s.id.clone());
                let mut member = (**s).clone();
                member.group_id = parent.clone();
                Arc::new(member)
            } else {
                Arc::clone(s)
            }
        })
        .collect();
    with_shapes_and_selection(state, shapes, members)
}

fn load(state: &EditorState, records: &[ShapeRecord], ids: &mut dyn IdGenerator) -> EditorState {
    let mut taken = HashSet::new();
    let mut remap: HashMap<ShapeId, ShapeId> = HashMap::new();
    let mut shapes: Vec<ShapeRecord> = Vec::with_capacity(records.len());
    for record in records {
        let mut shape = record.clone();
        shape.is_selected = false;
        if shape.id.as_str().is_empty() || taken.contains(&shape.id) {
            let id = fresh_id(&taken, shape.kind, ids);
            remap.entry(shape.id.clone()).or_insert_with(|| id.clone());
            shape.id = id;
        }
        taken.insert(shape.id.clone());
        shapes.push(shape);
    }
    for shape in &mut shapes {
        if let Some(group) = &shape.group_id {
            if !taken.contains(group) {
                shape.group_id = remap.get(group).cloned();
            }
        }
    }
    log::debug!("load {} shape(s)", shapes.len());
    EditorState {
        shapes: Arc::new(shapes.into_iter().map(Arc::new).collect()),
        tool: clear_selection_tool(&state.tool),
        ..state.clone()
    }
}
