use artboard_core::shapes::{SequentialIds, SerializableColor};
use artboard_core::store::ReorderOp;
use artboard_core::{Action, CanvasPatch, EditorStore, ShapePatch, ShapeRecord, ToolKind};
use kurbo::Vec2;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn store() -> EditorStore {
    EditorStore::new()
        .with_ids(SequentialIds::new())
        .with_default_history()
}

#[test]
fn undo_redo_walks_document_changes() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    let id = store.state().selected_ids()[0].clone();
    let original_fill = store.state().shape(&id).unwrap().style.fill;
    store.dispatch(Action::UpdateShape {
        id: id.clone(),
        patch: ShapePatch::new().fill(Some(SerializableColor::rgb(0, 128, 0))),
    });
    assert_eq!(store.history().unwrap().undo_label(), Some("update shape"));

    assert!(store.undo());
    assert_eq!(store.state().shape(&id).unwrap().style.fill, original_fill);
    assert!(store.undo());
    assert!(store.state().is_empty());
    assert!(!store.undo());

    assert!(store.redo());
    assert!(store.redo());
    assert_eq!(
        store.state().shape(&id).unwrap().style.fill,
        Some(SerializableColor::rgb(0, 128, 0))
    );
    assert!(!store.redo());
    assert!(store.state().is_consistent());
}

#[test]
fn view_and_ui_changes_are_not_recorded() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    store.dispatch(Action::UpdateCanvas(CanvasPatch::zoom(3.0)));
    store.dispatch(Action::UpdateCanvas(CanvasPatch::offset(Vec2::new(40.0, 0.0))));
    store.dispatch(Action::SetTool(ToolKind::Pan));
    store.dispatch(Action::DeselectAll);
    assert_eq!(store.history().unwrap().undo_depth(), 1);

    assert!(store.undo());
    assert!(store.state().is_empty());
    // The view stays where the user left it.
    assert_eq!(store.state().canvas.zoom, 3.0);
    assert_eq!(store.state().canvas.offset, Vec2::new(40.0, 0.0));
    assert_eq!(store.state().tool.active, ToolKind::Pan);
}

#[test]
fn artboard_changes_are_undoable() {
    let mut store = store();
    let background = SerializableColor::rgb(10, 20, 30);
    store.dispatch(Action::UpdateCanvas(CanvasPatch::artboard(640.0, 480.0, background)));
    assert_eq!(store.state().canvas.artboard().width(), 640.0);
    assert!(store.undo());
    assert_ne!(store.state().canvas.artboard().width(), 640.0);
}

#[test]
fn undo_drops_vanished_ids_from_selection() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
    let second = store.state().selected_ids()[0].clone();

    store.undo();
    assert!(!store.state().contains(&second));
    assert!(store.state().selected_ids().is_empty());
    assert!(store.state().is_consistent());
}

#[test]
fn new_change_clears_redo() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    let a = store.state().selected_ids()[0].clone();
    store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
    store.undo();
    assert!(store.can_redo());
    store.dispatch(Action::UpdateShape {
        id: a,
        patch: ShapePatch::new().position(5.0, 5.0),
    });
    assert!(!store.can_redo());
}

#[test]
fn edits_that_change_nothing_leave_no_undo_step() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    let id = store.state().selected_ids()[0].clone();

    store.dispatch(Action::UpdateShape {
        id: "missing".into(),
        patch: ShapePatch::new().position(50.0, 50.0),
    });
    store.dispatch(Action::Reorder {
        id: id.clone(),
        op: ReorderOp::ToFront,
    });
    store.dispatch(Action::UpdateShape {
        id: id.clone(),
        patch: ShapePatch::new().position(0.0, 0.0),
    });
    store.dispatch(Action::DeleteShape("missing".into()));
    store.dispatch_batch("nothing", Vec::new());
    assert_eq!(store.history().unwrap().undo_depth(), 1);

    assert!(store.undo());
    assert!(store.state().is_empty());
}

#[test]
fn batch_is_one_undo_step() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
    let ids: Vec<_> = store.state().iter().map(|s| s.id.clone()).collect();
    let fills: Vec<_> = store.state().iter().map(|s| s.style.fill).collect();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let green = Some(SerializableColor::rgb(0, 128, 0));
    store.dispatch_batch(
        "set fill",
        ids.iter().map(|id| Action::UpdateShape {
            id: id.clone(),
            patch: ShapePatch::new().fill(green),
        }),
    );
    assert!(store.state().iter().all(|s| s.style.fill == green));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(store.history().unwrap().undo_label(), Some("set fill"));

    assert!(store.undo());
    let restored: Vec<_> = store.state().iter().map(|s| s.style.fill).collect();
    assert_eq!(restored, fills);
    assert_eq!(store.state().len(), 2);

    assert!(store.redo());
    assert!(store.state().iter().all(|s| s.style.fill == green));
}

#[test]
fn history_limit_bounds_undo_depth() {
    let mut store = EditorStore::new()
        .with_ids(SequentialIds::new())
        .with_history(3);
    for i in 0..10 {
        store.dispatch(Action::AddShape(ShapeRecord::rect(i as f64, 0.0, 1.0, 1.0)));
    }
    let mut undone = 0;
    while store.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(store.state().len(), 7);
}

#[test]
fn store_without_history_cannot_undo() {
    let mut store = EditorStore::new();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    assert!(store.history().is_none());
    assert!(!store.can_undo());
    assert!(!store.undo());
    assert_eq!(store.state().len(), 1);
}
