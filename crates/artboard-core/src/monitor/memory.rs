//! Memory accounting for the document and its undo history.

use crate::history::History;
use crate::shapes::{ShapeKind, ShapeRecord};
use crate::store::EditorState;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// 64 MiB.
pub const DEFAULT_MEMORY_BUDGET_BYTES: usize = 64 * 1024 * 1024;

/// Shape count above which hit testing and rendering slow down noticeably.
const LARGE_DOCUMENT_SHAPES: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryWarning {
    pub message: String,
    pub suggestion: String,
}

/// Measured memory use.
///
/// Byte counts are serialized-JSON sizes: a stable, allocator-independent
/// proxy for the heap the records occupy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    pub shape_counts: BTreeMap<String, usize>,
    pub total_shapes: usize,
    pub document_bytes: usize,
    /// Encoded image data, included in `document_bytes`.
    pub image_bytes: usize,
    pub history_snapshots: usize,
    /// Shape records held only by history (shared records counted once).
    pub history_bytes: usize,
    pub total_bytes: usize,
    pub budget_bytes: usize,
    pub warnings: Vec<MemoryWarning>,
}

impl MemoryReport {
    /// Estimate memory held by `state` and the snapshots in `history`.
    pub fn measure(
        state: &EditorState,
        history: Option<&History<EditorState>>,
        budget_bytes: usize,
    ) -> Self {
        let mut shape_counts = BTreeMap::new();
        for kind in ShapeKind::ALL {
            shape_counts.insert(kind.as_str().to_string(), 0);
        }
        let mut document_bytes = 0;
        let mut image_bytes = 0;
        let mut live: HashSet<*const ShapeRecord> = HashSet::new();
        for shape in state.shapes.iter() {
            *shape_counts.entry(shape.kind.as_str().to_string()).or_insert(0) += 1;
            document_bytes += shape.estimated_bytes();
            image_bytes += shape.image.as_ref().map_or(0, |i| i.encoded_len());
            live.insert(Arc::as_ptr(shape));
        }

        let mut history_snapshots = 0;
        let mut history_bytes = 0;
        if let Some(history) = history {
            let mut seen = live;
            for snapshot in history.snapshots() {
                history_snapshots += 1;
                for shape in snapshot.shapes.iter() {
                    if seen.insert(Arc::as_ptr(shape)) {
                        history_bytes += shape.estimated_bytes();
                    }
                }
            }
        }

        let mut report = Self {
            shape_counts,
            total_shapes: state.len(),
            document_bytes,
            image_bytes,
            history_snapshots,
            history_bytes,
            total_bytes: document_bytes + history_bytes,
            budget_bytes,
            warnings: Vec::new(),
        };
        report.warnings = report.check();
        report
    }

    fn check(&self) -> Vec<MemoryWarning> {
        let mut warnings = Vec::new();
        if self.total_bytes > self.budget_bytes {
            warnings.push(MemoryWarning {
                message: format!(
                    "Using {} of a {} budget",
                    format_bytes(self.total_bytes),
                    format_bytes(self.budget_bytes)
                ),
                suggestion: "Save and clear undo history, or remove unused shapes".to_string(),
            });
        }
        if self.image_bytes > self.budget_bytes / 2 {
            warnings.push(MemoryWarning {
                message: format!("Images take {}", format_bytes(self.image_bytes)),
                suggestion: "Downscale or compress large images before importing".to_string(),
            });
        }
        if self.document_bytes > 0 && self.history_bytes > self.document_bytes * 4 {
            warnings.push(MemoryWarning {
                message: format!(
                    "Undo history holds {} across {} snapshots",
                    format_bytes(self.history_bytes),
                    self.history_snapshots
                ),
                suggestion: "Lower the history limit".to_string(),
            });
        }
        if self.total_shapes > LARGE_DOCUMENT_SHAPES {
            warnings.push(MemoryWarning {
                message: format!("{} shapes in one document", self.total_shapes),
                suggestion: "Split the design across documents or flatten finished groups"
                    .to_string(),
            });
        }
        warnings
    }

    /// True when the total fits the budget.
    pub fn is_within_budget(&self) -> bool {
        self.total_bytes <= self.budget_bytes
    }
}

/// `"1.5 MiB"` style formatting.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{SequentialIds, ShapePatch};
    use crate::store::{Action, EditorStore};
    use kurbo::Point;

    #[test]
    fn test_counts_and_bytes() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        store.dispatch(Action::AddShape(ShapeRecord::text(Point::ZERO, "hi")));

        let report = MemoryReport::measure(store.state(), None, DEFAULT_MEMORY_BUDGET_BYTES);
        assert_eq!(report.shape_counts["rect"], 2);
        assert_eq!(report.shape_counts["text"], 1);
        assert_eq!(report.shape_counts["image"], 0);
        assert_eq!(report.total_shapes, 3);
        assert!(report.document_bytes > 0);
        assert_eq!(report.history_bytes, 0);
        assert!(report.is_within_budget());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_history_counts_only_unshared_records() {
        let mut store = EditorStore::new()
            .with_ids(SequentialIds::new())
            .with_default_history();
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        let id = store.state().selected_ids()[0].clone();
        store.dispatch(Action::AddShape(ShapeRecord::rect(5.0, 5.0, 1.0, 1.0)));
        store.dispatch(Action::UpdateShape {
            id: id.clone(),
            patch: ShapePatch::new().position(9.0, 9.0),
        });

        let report = MemoryReport::measure(store.state(), store.history(), usize::MAX);
        assert_eq!(report.history_snapshots, 4);
        assert!(report.history_bytes > 0);
        // Superseded versions of the first rect; the second is shared.
        let single = store.state().shape(&id).unwrap().estimated_bytes();
        assert!(report.history_bytes <= single * 3);
    }

    #[test]
    fn test_over_budget_warning() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        let report = MemoryReport::measure(store.state(), None, 10);
        assert!(!report.is_within_budget());
        assert!(report.warnings[0].message.contains("budget"));
    }

    #[test]
    fn test_truncated_image_data() {
        let json = r#"{"format":"png","sourceWidth":1,"sourceHeight":1,"data":"a="}"#;
        let source = serde_json::from_str(json).unwrap();
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::image(Point::ZERO, source, 10.0)));

        let report = MemoryReport::measure(store.state(), None, DEFAULT_MEMORY_BUDGET_BYTES);
        assert_eq!(report.shape_counts["image"], 1);
        assert_eq!(report.image_bytes, 0);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }
}
