//! Periodic saving of the open document.

use super::{SavedDocument, Storage, StorageResult};
use crate::store::EditorState;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key for the "last opened" document.
pub const LAST_DOCUMENT_KEY: &str = "__last_document__";

/// Tracks unsaved changes and writes the document through a [`Storage`].
pub struct AutoSaveManager<S: Storage + ?Sized> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    document_id: String,
    document_name: String,
}

impl<S: Storage + ?Sized> AutoSaveManager<S> {
    /// Create a manager for a new, unnamed document.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            document_id: format!("doc-{}", super::now_millis()),
            document_name: "Untitled".to_string(),
        }
    }

    /// Set the autosave interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Change the autosave interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Current autosave interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the document as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True when there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Switch to a new document without saving.
    pub fn set_document(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.document_id = id.into();
        self.document_name = name.into();
    }

    /// Id the current document saves under.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Dirty and the interval has elapsed since the last save.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if [`AutoSaveManager::should_save`]. Returns true if a save happened.
    pub async fn maybe_save(&mut self, state: &EditorState) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(state).await?;
        Ok(true)
    }

    /// Save immediately, under the document id and as the last document.
    pub async fn save(&mut self, state: &EditorState) -> StorageResult<SavedDocument> {
        let document = SavedDocument::from_state(&self.document_id, &self.document_name, state);
        self.storage.save(&self.document_id, &document).await?;
        self.storage.save(LAST_DOCUMENT_KEY, &document).await?;

        log::info!("Saved document {} ({} shapes)", self.document_id, document.shapes.len());
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(document)
    }

    /// Load a document by ID and make it the current one.
    pub async fn load(&mut self, id: &str) -> StorageResult<SavedDocument> {
        let doc = self.storage.load(id).await?;
        self.adopt(&doc);
        Ok(doc)
    }

    /// Load the last saved document, if any.
    pub async fn load_last(&mut self) -> Option<SavedDocument> {
        match self.storage.load(LAST_DOCUMENT_KEY).await {
            Ok(doc) => {
                self.adopt(&doc);
                Some(doc)
            }
            Err(e) => {
                log::debug!("No last document: {}", e);
                None
            }
        }
    }

    fn adopt(&mut self, doc: &SavedDocument) {
        self.document_id = doc.id.clone();
        self.document_name = doc.name.clone();
        self.dirty = false;
        self.last_save = Some(Instant::now());
    }

    /// Delete a saved document.
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await
    }

    /// Saved document ids, without the last-document key.
    pub async fn list_documents(&self) -> StorageResult<Vec<String>> {
        let mut docs = self.storage.list().await?;
        docs.retain(|id| id != LAST_DOCUMENT_KEY);
        Ok(docs)
    }

    /// Backend documents are saved to.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
