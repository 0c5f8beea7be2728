//! Local-first saving with a queue of changes waiting for connectivity.

use crate::storage::{BoxFuture, SavedDocument, Storage, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Remote sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote unreachable: {0}")]
    Unreachable(String),
    #[error("Remote rejected document: {0}")]
    Rejected(String),
}

/// Connection quality classes, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectiveType {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    #[default]
    FourG,
}

/// Network conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub online: bool,
    pub effective_type: EffectiveType,
    /// Estimated bandwidth in Mbit/s.
    pub downlink: f64,
    /// Estimated round-trip time in milliseconds.
    pub rtt: u32,
    /// User asked for reduced data usage.
    pub save_data: bool,
}

impl Default for NetworkInfo {
    fn default() -> Self {
        Self::online()
    }
}

impl NetworkInfo {
    /// A fast, connected network.
    pub fn online() -> Self {
        Self {
            online: true,
            effective_type: EffectiveType::FourG,
            downlink: 10.0,
            rtt: 50,
            save_data: false,
        }
    }

    /// No connection.
    pub fn offline() -> Self {
        Self {
            online: false,
            downlink: 0.0,
            rtt: 0,
            ..Self::online()
        }
    }

    /// Slow or metered: uploads should wait for an explicit sync.
    pub fn is_constrained(&self) -> bool {
        self.save_data
            || matches!(self.effective_type, EffectiveType::Slow2g | EffectiveType::TwoG)
            || self.rtt > 1000
    }
}

/// Remote end of synchronization.
pub trait RemoteSync: Send + Sync {
    fn upload(&self, document: &SavedDocument) -> BoxFuture<'_, Result<(), SyncError>>;
}

/// A document waiting to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub document: SavedDocument,
    /// Upload attempts that failed so far.
    pub attempts: u32,
}

/// Outcome of [`OfflineManager::sync`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub synced: Vec<String>,
    /// Document id and error message.
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    /// True when every pending change synced.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Saves locally first and uploads when the network allows.
pub struct OfflineManager<S: Storage + ?Sized, R: RemoteSync + ?Sized> {
    local: Arc<S>,
    remote: Arc<R>,
    network: NetworkInfo,
    /// One entry per document, oldest first.
    pending: Vec<PendingChange>,
}

impl<S: Storage + ?Sized, R: RemoteSync + ?Sized> OfflineManager<S, R> {
    /// Store over `local`, syncing to `remote` when online.
    pub fn new(local: Arc<S>, remote: Arc<R>) -> Self {
        Self {
            local,
            remote,
            network: NetworkInfo::default(),
            pending: Vec::new(),
        }
    }

    /// Last reported network state.
    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    /// True while connected.
    pub fn is_online(&self) -> bool {
        self.network.online
    }

    /// Record new network conditions. Returns true when connectivity just
    /// came back and there are changes to sync.
    pub fn update_network(&mut self, info: NetworkInfo) -> bool {
        let was_online = self.network.online;
        self.network = info;
        if was_online != info.online {
            log::info!(
                "Network {}; {} pending change(s)",
                if info.online { "online" } else { "offline" },
                self.pending.len()
            );
        }
        !was_online && info.online && !self.pending.is_empty()
    }

    /// Save locally and queue for upload. The queued entry replaces any
    /// earlier entry for the same document.
    pub async fn save(&mut self, document: &SavedDocument) -> StorageResult<()> {
        self.local.save(&document.id, document).await?;
        match self.pending.iter_mut().find(|p| p.document.id == document.id) {
            Some(entry) => entry.document = document.clone(),
            None => self.pending.push(PendingChange {
                document: document.clone(),
                attempts: 0,
            }),
        }
        Ok(())
    }

    /// Save, then upload right away when online and unconstrained.
    pub async fn save_and_sync(&mut self, document: &SavedDocument) -> StorageResult<SyncReport> {
        self.save(document).await?;
        if self.network.online && !self.network.is_constrained() {
            Ok(self.sync().await)
        } else {
            Ok(SyncReport::default())
        }
    }

    /// Upload every pending change. Failed uploads stay queued. Does
    /// nothing while offline.
    pub async fn sync(&mut self) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.network.online {
            return report;
        }
        let mut remaining = Vec::new();
        for mut change in std::mem::take(&mut self.pending) {
            match self.remote.upload(&change.document).await {
                Ok(()) => report.synced.push(change.document.id.clone()),
                Err(e) => {
                    log::warn!("Sync of {} failed: {}", change.document.id, e);
                    report.failed.push((change.document.id.clone(), e.to_string()));
                    change.attempts += 1;
                    remaining.push(change);
                }
            }
        }
        self.pending = remaining;
        report
    }

    /// Changes queued while offline, oldest first.
    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    /// Ids of documents waiting to sync.
    pub fn pending_ids(&self) -> Vec<&str> {
        self.pending.iter().map(|p| p.document.id.as_str()).collect()
    }

    /// Load from local storage (works offline).
    pub async fn load(&self, id: &str) -> StorageResult<SavedDocument> {
        self.local.load(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use pollster::block_on;
    use std::sync::Mutex;

    /// Records uploads; rejects ids listed in `reject`.
    #[derive(Default)]
    struct RecordingRemote {
        uploaded: Mutex<Vec<SavedDocument>>,
        reject: Vec<String>,
    }

    impl RemoteSync for RecordingRemote {
        fn upload(&self, document: &SavedDocument) -> BoxFuture<'_, Result<(), SyncError>> {
            let document = document.clone();
            Box::pin(async move {
                if self.reject.contains(&document.id) {
                    return Err(SyncError::Rejected(document.id));
                }
                self.uploaded
                    .lock()
                    .map_err(|e| SyncError::Unreachable(e.to_string()))?
                    .push(document);
                Ok(())
            })
        }
    }

    fn doc(id: &str, name: &str) -> SavedDocument {
        SavedDocument::new(id, name)
    }

    #[test]
    fn test_offline_queue_keeps_latest() {
        let remote = Arc::new(RecordingRemote::default());
        let mut manager = OfflineManager::new(Arc::new(MemoryStorage::new()), remote.clone());
        manager.update_network(NetworkInfo::offline());

        block_on(manager.save(&doc("a", "first"))).unwrap();
        block_on(manager.save(&doc("b", "other"))).unwrap();
        block_on(manager.save(&doc("a", "second"))).unwrap();
        assert_eq!(manager.pending_ids(), vec!["a", "b"]);
        assert_eq!(manager.pending()[0].document.name, "second");

        assert_eq!(block_on(manager.sync()), SyncReport::default());
        assert_eq!(block_on(manager.load("a")).unwrap().name, "second");

        assert!(manager.update_network(NetworkInfo::online()));
        let report = block_on(manager.sync());
        assert_eq!(report.synced, vec!["a", "b"]);
        assert!(manager.pending().is_empty());
        assert_eq!(remote.uploaded.lock().unwrap()[0].name, "second");
    }

    #[test]
    fn test_failed_uploads_stay_queued() {
        let remote = Arc::new(RecordingRemote {
            reject: vec!["bad".to_string()],
            ..RecordingRemote::default()
        });
        let mut manager = OfflineManager::new(Arc::new(MemoryStorage::new()), remote);
        block_on(manager.save(&doc("good", "g"))).unwrap();
        block_on(manager.save(&doc("bad", "b"))).unwrap();

        let report = block_on(manager.sync());
        assert_eq!(report.synced, vec!["good"]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(manager.pending_ids(), vec!["bad"]);
        assert_eq!(manager.pending()[0].attempts, 1);
    }

    #[test]
    fn test_constrained_network_defers_upload() {
        let remote = Arc::new(RecordingRemote::default());
        let mut manager = OfflineManager::new(Arc::new(MemoryStorage::new()), remote.clone());
        manager.update_network(NetworkInfo {
            save_data: true,
            ..NetworkInfo::online()
        });
        let report = block_on(manager.save_and_sync(&doc("a", "A"))).unwrap();
        assert!(report.synced.is_empty());
        assert_eq!(manager.pending_ids(), vec!["a"]);

        manager.update_network(NetworkInfo::online());
        let report = block_on(manager.save_and_sync(&doc("a", "A2"))).unwrap();
        assert_eq!(report.synced, vec!["a"]);
        assert_eq!(remote.uploaded.lock().unwrap().len(), 1);
    }
}
