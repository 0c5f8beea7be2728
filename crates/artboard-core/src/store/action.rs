//! Actions accepted by the reducer.

use crate::canvas::CanvasPatch;
use crate::shapes::{ShapeId, ShapePatch, ShapeRecord};
use crate::tools::{DrawingState, PanelKind, ToolKind, ToolSettingsPatch};
use kurbo::Point;

/// Paint-order moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOp {
    ToFront,
    ToBack,
    Forward,
    Backward,
    /// Move to an absolute index (clamped to the collection).
    ToIndex(usize),
}

/// A state transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Add a shape; its id is replaced with a fresh one and it becomes the
    /// only selected shape.
    AddShape(ShapeRecord),
    UpdateShape { id: ShapeId, patch: ShapePatch },
    DeleteShape(ShapeId),
    DeleteSelected,
    SelectShapes(Vec<ShapeId>),
    DeselectAll,
    SetTool(ToolKind),
    UpdateCanvas(CanvasPatch),
    UpdateToolSettings(ToolSettingsPatch),
    OpenPanel { panel: PanelKind, position: Point },
    ClosePanel(PanelKind),
    SetDrawingState(DrawingState),
    Reorder { id: ShapeId, op: ReorderOp },
    DuplicateShapes(Vec<ShapeId>),
    GroupShapes(Vec<ShapeId>),
    Ungroup(ShapeId),
    /// Replace the whole collection.
    LoadShapes(Vec<ShapeRecord>),
    ClearCanvas,
}

impl Action {
    /// Short label for logs and history.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddShape(_) => "add shape",
            Action::UpdateShape { .. } => "update shape",
            Action::DeleteShape(_) => "delete shape",
            Action::DeleteSelected => "delete selected",
            Action::SelectShapes(_) => "select shapes",
            Action::DeselectAll => "deselect all",
            Action::SetTool(_) => "set tool",
            Action::UpdateCanvas(_) => "update canvas",
            Action::UpdateToolSettings(_) => "update tool settings",
            Action::OpenPanel { .. } => "open panel",
            Action::ClosePanel(_) => "close panel",
            Action::SetDrawingState(_) => "set drawing state",
            Action::Reorder { .. } => "reorder",
            Action::DuplicateShapes(_) => "duplicate",
            Action::GroupShapes(_) => "group",
            Action::Ungroup(_) => "ungroup",
            Action::LoadShapes(_) => "load shapes",
            Action::ClearCanvas => "clear canvas",
        }
    }

    /// Whether the action edits the document and so belongs in undo
    /// history. Pan/zoom, selection, tool, panel and drawing changes do not.
    pub fn is_undoable(&self) -> bool {
        match self {
            Action::UpdateCanvas(patch) => !patch.is_view_only(),
            Action::SelectShapes(_)
            | Action::DeselectAll
            | Action::SetTool(_)
            | Action::UpdateToolSettings(_)
            | Action::OpenPanel { .. }
            | Action::ClosePanel(_)
            | Action::SetDrawingState(_) => false,
            _ => true,
        }
    }
}
