//! Storage abstraction for persistence.

mod autosave;
mod fallback;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, LAST_DOCUMENT_KEY};
pub use fallback::FallbackStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::canvas::CanvasView;
use crate::shapes::{ShapeRecord, TimestampIds};
use crate::store::{Action, EditorState, reduce};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

impl StorageError {
    /// Whether the backend itself failed (as opposed to a missing or
    /// malformed document).
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, StorageError::Io(_) | StorageError::Other(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A persisted document: shapes in paint order plus the canvas settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocument {
    pub id: String,
    pub name: String,
    pub shapes: Vec<ShapeRecord>,
    pub canvas: CanvasView,
    /// Unix time in milliseconds.
    pub saved_at: u64,
}

impl SavedDocument {
    /// Empty document.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shapes: Vec::new(),
            canvas: CanvasView::default(),
            saved_at: 0,
        }
    }

    /// Snapshot the editor state. Selection flags are not persisted.
    pub fn from_state(id: impl Into<String>, name: impl Into<String>, state: &EditorState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shapes: state
                .iter()
                .map(|s| {
                    let mut shape = s.clone();
                    shape.is_selected = false;
                    shape
                })
                .collect(),
            canvas: (*state.canvas).clone(),
            saved_at: now_millis(),
        }
    }

    /// Fresh editor state holding this document.
    pub fn to_state(&self) -> EditorState {
        let empty = EditorState {
            canvas: Arc::new(self.canvas.clone()),
            ..EditorState::default()
        };
        reduce(&empty, &Action::LoadShapes(self.shapes.clone()), &mut TimestampIds)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> StorageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse a saved document.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Trait for document storage backends.
pub trait Storage: Send + Sync {
    /// Save a document.
    fn save(&self, id: &str, document: &SavedDocument) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a document.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SavedDocument>>;

    /// Delete a document.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all document IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}
