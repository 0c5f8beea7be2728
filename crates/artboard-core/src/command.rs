//! Editor commands shared by keyboard shortcuts and voice input.

use crate::canvas::CanvasPatch;
use crate::shapes::{SerializableColor, ShapeKind, ShapePatch, ShapeRecord};
use crate::store::{Action, EditorState, ReorderOp};
use crate::theme::ThemeKind;
use crate::tools::{PanelKind, ToolKind, ToolSettingsPatch};
use kurbo::{Point, Vec2};

/// Resize factor for `Bigger`/`Smaller`.
pub const RESIZE_STEP: f64 = 1.2;
/// Zoom factor for `ZoomIn`/`ZoomOut`.
pub const ZOOM_STEP: f64 = 1.25;
/// Size of shapes added by `AddShape`.
pub const NEW_SHAPE_SIZE: f64 = 100.0;

/// An editor command, independent of the input that triggered it
/// (keyboard shortcut or voice).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddShape(ShapeKind),
    DeleteSelected,
    Undo,
    Redo,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SelectAll,
    Deselect,
    SetFill(SerializableColor),
    Bigger,
    Smaller,
    BringToFront,
    SendToBack,
    Group,
    Ungroup,
    Duplicate,
    SetTool(ToolKind),
    SetTheme(ThemeKind),
    OpenPanel(PanelKind),
}

/// What the caller should do with a resolved command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEffect {
    Dispatch(Vec<Action>),
    Undo,
    Redo,
    SetTheme(ThemeKind),
    /// Nothing applies (e.g. delete with no selection).
    Nothing,
}

/// Turn a command into store actions against `state`.
pub fn resolve(command: &Command, state: &EditorState) -> CommandEffect {
    let selected = state.selected_ids().to_vec();
    let dispatch = |actions: Vec<Action>| {
        if actions.is_empty() {
            CommandEffect::Nothing
        } else {
            CommandEffect::Dispatch(actions)
        }
    };

    match command {
        Command::Undo => CommandEffect::Undo,
        Command::Redo => CommandEffect::Redo,
        Command::SetTheme(kind) => CommandEffect::SetTheme(*kind),
        Command::AddShape(kind) => dispatch(vec![Action::AddShape(new_shape(*kind, state))]),
        Command::DeleteSelected if !selected.is_empty() => dispatch(vec![Action::DeleteSelected]),
        Command::DeleteSelected => CommandEffect::Nothing,
        Command::ZoomIn => dispatch(vec![zoom_action(state, ZOOM_STEP)]),
        Command::ZoomOut => dispatch(vec![zoom_action(state, 1.0 / ZOOM_STEP)]),
        Command::ResetZoom => dispatch(vec![Action::UpdateCanvas(CanvasPatch {
            zoom: Some(1.0),
            offset: Some(Vec2::ZERO),
            ..CanvasPatch::default()
        })]),
        Command::SelectAll => dispatch(vec![Action::SelectShapes(
            state
                .iter()
                .filter(|s| s.group_id.is_none())
                .map(|s| s.id.clone())
                .collect(),
        )]),
        Command::Deselect => dispatch(vec![Action::DeselectAll]),
        Command::SetFill(color) if selected.is_empty() => {
            dispatch(vec![Action::UpdateToolSettings(ToolSettingsPatch {
                fill: Some(Some(*color)),
                ..ToolSettingsPatch::default()
            })])
        }
        Command::SetFill(color) => dispatch(
            selected
                .into_iter()
                .map(|id| Action::UpdateShape {
                    id,
                    patch: ShapePatch::new().fill(Some(*color)),
                })
                .collect(),
        ),
        Command::Bigger => dispatch(resize_selection(state, RESIZE_STEP)),
        Command::Smaller => dispatch(resize_selection(state, 1.0 / RESIZE_STEP)),
        Command::BringToFront => dispatch(reorder_selection(state, ReorderOp::ToFront)),
        Command::SendToBack => dispatch(reorder_selection(state, ReorderOp::ToBack)),
        Command::Group if selected.len() >= 2 => dispatch(vec![Action::GroupShapes(selected)]),
        Command::Group => CommandEffect::Nothing,
        Command::Ungroup => dispatch(
            state
                .selected_shapes()
                .into_iter()
                .filter(|s| s.kind == ShapeKind::Group)
                .map(|s| Action::Ungroup(s.id.clone()))
                .collect(),
        ),
        Command::Duplicate if !selected.is_empty() => {
            dispatch(vec![Action::DuplicateShapes(selected)])
        }
        Command::Duplicate => CommandEffect::Nothing,
        Command::SetTool(tool) => dispatch(vec![Action::SetTool(*tool)]),
        Command::OpenPanel(panel) => dispatch(vec![Action::OpenPanel {
            panel: *panel,
            position: Point::new(24.0, 24.0),
        }]),
    }
}

/// New shape of `kind` centered on the artboard, styled from tool settings.
fn new_shape(kind: ShapeKind, state: &EditorState) -> ShapeRecord {
    let settings = &state.tool.settings;
    let center = state.canvas.artboard().center();
    let half = NEW_SHAPE_SIZE / 2.0;
    let mut shape = match kind {
        ShapeKind::Circle => ShapeRecord::circle(center, half),
        ShapeKind::Line => ShapeRecord::line(&[
            Point::new(center.x - half, center.y),
            Point::new(center.x + half, center.y),
        ]),
        ShapeKind::Text => {
            let mut text = ShapeRecord::text(center, "Text");
            if let Some(block) = text.text.as_mut() {
                block.font_family = settings.font_family.clone();
                block.font_size = settings.font_size;
                let (w, h) = block.estimated_size();
                text.width = w;
                text.height = h;
            }
            text.x -= text.width / 2.0;
            text.y -= text.height / 2.0;
            return text;
        }
        ShapeKind::Icon => ShapeRecord::icon(
            Point::new(center.x - half, center.y - half),
            settings.icon.clone(),
            NEW_SHAPE_SIZE,
        ),
        _ => {
            let mut rect = ShapeRecord::rect(
                center.x - half,
                center.y - half,
                NEW_SHAPE_SIZE,
                NEW_SHAPE_SIZE,
            );
            rect.corner_radius = settings.corner_radius;
            rect
        }
    };
    shape.style = settings.style();
    shape
}

fn zoom_action(state: &EditorState, factor: f64) -> Action {
    let mut view = (*state.canvas).clone();
    let anchor = view.world_to_screen(view.artboard().center());
    view.zoom_at(anchor, factor);
    Action::UpdateCanvas(CanvasPatch {
        zoom: Some(view.zoom),
        offset: Some(view.offset),
        ..CanvasPatch::default()
    })
}

/// Scale each selected shape about its center.
fn resize_selection(state: &EditorState, factor: f64) -> Vec<Action> {
    state
        .selected_shapes()
        .into_iter()
        .filter(|s| s.kind != ShapeKind::Group && !s.locked)
        .map(|s| {
            let (w, h) = s.scaled_size();
            let dx = (w * factor - w) / 2.0;
            let dy = (h * factor - h) / 2.0;
            Action::UpdateShape {
                id: s.id.clone(),
                patch: ShapePatch::new()
                    .scale(s.scale_x * factor, s.scale_y * factor)
                    .position(s.x - dx, s.y - dy),
            }
        })
        .collect()
}

/// Reorder the selection keeping its relative paint order.
fn reorder_selection(state: &EditorState, op: ReorderOp) -> Vec<Action> {
    let mut ids: Vec<_> = state
        .selected_ids()
        .iter()
        .filter_map(|id| state.index_of(id).map(|i| (i, id.clone())))
        .collect();
    ids.sort_by_key(|(i, _)| *i);
    if op == ReorderOp::ToBack {
        ids.reverse();
    }
    ids.into_iter()
        .map(|(_, id)| Action::Reorder { id, op })
        .collect()
}
