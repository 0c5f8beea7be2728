//! Storage that degrades to a secondary backend when the primary fails.

use super::{BoxFuture, SavedDocument, Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tries `primary` first. When it fails with a backend error (I/O, lock),
/// the operation is retried on `secondary` and a warning is logged the
/// first time. Missing or malformed documents are not backend errors.
pub struct FallbackStorage {
    primary: Arc<dyn Storage>,
    secondary: Arc<dyn Storage>,
    degraded: AtomicBool,
}

impl FallbackStorage {
    /// Use `primary`, switching to `secondary` when its backend fails.
    pub fn new(primary: Arc<dyn Storage>, secondary: Arc<dyn Storage>) -> Self {
        Self {
            primary,
            secondary,
            degraded: AtomicBool::new(false),
        }
    }

    /// Whether the primary backend has failed at least once.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn note_failure(&self, op: &str, error: &StorageError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            log::warn!("Primary storage failed during {}: {}; using fallback", op, error);
        } else {
            log::debug!("Primary storage failed during {}: {}", op, error);
        }
    }

    /// Load `id`, or an empty document when it cannot be loaded from
    /// either backend.
    pub async fn load_or_default(&self, id: &str) -> SavedDocument {
        match self.load(id).await {
            Ok(doc) => doc,
            Err(e) => {
                if !matches!(e, StorageError::NotFound(_)) {
                    log::warn!("Could not load {}: {}; starting with an empty document", id, e);
                }
                SavedDocument::new(id, "Untitled")
            }
        }
    }
}

impl Storage for FallbackStorage {
    fn save(&self, id: &str, document: &SavedDocument) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let document = document.clone();
        Box::pin(async move {
            match self.primary.save(&id, &document).await {
                Err(e) if e.is_backend_failure() => {
                    self.note_failure("save", &e);
                    self.secondary.save(&id, &document).await
                }
                other => other,
            }
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SavedDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            match self.primary.load(&id).await {
                Ok(doc) => Ok(doc),
                Err(e) if e.is_backend_failure() => {
                    self.note_failure("load", &e);
                    self.secondary.load(&id).await
                }
                // Saved while degraded.
                Err(StorageError::NotFound(_)) => self.secondary.load(&id).await,
                Err(e) => Err(e),
            }
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let primary = self.primary.delete(&id).await;
            let secondary = self.secondary.delete(&id).await;
            match primary {
                Err(e) if e.is_backend_failure() => {
                    self.note_failure("delete", &e);
                    secondary
                }
                other => other,
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let mut ids = match self.primary.list().await {
                Ok(ids) => ids,
                Err(e) if e.is_backend_failure() => {
                    self.note_failure("list", &e);
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            ids.extend(self.secondary.list().await?);
            ids.sort();
            ids.dedup();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            match self.primary.exists(&id).await {
                Ok(true) => Ok(true),
                Ok(false) => self.secondary.exists(&id).await,
                Err(e) => {
                    self.note_failure("exists", &e);
                    self.secondary.exists(&id).await
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pollster::block_on;

    /// Backend whose every operation fails with an I/O error.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn save(&self, _: &str, _: &SavedDocument) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk unavailable".into())) })
        }
        fn load(&self, _: &str) -> BoxFuture<'_, StorageResult<SavedDocument>> {
            Box::pin(async { Err(StorageError::Io("disk unavailable".into())) })
        }
        fn delete(&self, _: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("disk unavailable".into())) })
        }
        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(async { Err(StorageError::Io("disk unavailable".into())) })
        }
        fn exists(&self, _: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(async { Err(StorageError::Io("disk unavailable".into())) })
        }
    }

    #[test]
    fn test_falls_back_on_backend_failure() {
        let memory = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(Arc::new(BrokenStorage), memory.clone());
        let doc = SavedDocument::new("doc", "Doc");

        assert!(!storage.is_degraded());
        block_on(storage.save("doc", &doc)).unwrap();
        assert!(storage.is_degraded());
        assert_eq!(memory.len(), 1);
        assert_eq!(block_on(storage.load("doc")).unwrap(), doc);
        assert_eq!(block_on(storage.list()).unwrap(), vec!["doc"]);
        assert!(block_on(storage.exists("doc")).unwrap());
    }

    #[test]
    fn test_primary_used_when_healthy() {
        let primary = Arc::new(MemoryStorage::new());
        let secondary = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(primary.clone(), secondary.clone());

        block_on(storage.save("doc", &SavedDocument::new("doc", "Doc"))).unwrap();
        assert_eq!(primary.len(), 1);
        assert!(secondary.is_empty());
        assert!(!storage.is_degraded());
    }

    #[test]
    fn test_load_or_default() {
        let storage = FallbackStorage::new(Arc::new(BrokenStorage), Arc::new(BrokenStorage));
        let doc = block_on(storage.load_or_default("missing"));
        assert_eq!(doc.id, "missing");
        assert!(doc.shapes.is_empty());
    }
}
