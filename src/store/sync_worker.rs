//! Background worker for fire-and-forget writes.
//!
//! Stores push commands onto an unbounded channel and return immediately.
//! A single spawned task drains the channel in order, forwarding field
//! patches to the remote and snapshots to the local cache. Failures are
//! logged and counted; nothing is retried or rolled back.

use crate::error::{NexusError, Result};
use crate::remote::{Collection, FieldPatch, RemoteSync};
use crate::storage::{CachedCollections, LocalCache};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum SyncCommand {
    Patch {
        collection: Collection,
        id: String,
        patch: FieldPatch,
    },
    Persist(CachedCollections),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct SyncCounters {
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Cloneable sender side of the sync worker
#[derive(Clone)]
pub struct SyncHandle {
    sender: Option<mpsc::UnboundedSender<SyncCommand>>,
    counters: Arc<SyncCounters>,
}

impl SyncHandle {
    /// Spawns the worker on the current tokio runtime
    pub fn spawn(remote: RemoteSync, cache: Option<Arc<dyn LocalCache>>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| NexusError::RuntimeUnavailable)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(SyncCounters::default());

        runtime.spawn(run_worker(rx, remote, cache, counters.clone()));

        Ok(Self {
            sender: Some(tx),
            counters,
        })
    }

    /// A handle with no worker; every command is discarded
    pub fn detached() -> Self {
        Self {
            sender: None,
            counters: Arc::new(SyncCounters::default()),
        }
    }

    pub fn is_detached(&self) -> bool {
        self.sender.is_none()
    }

    /// Queues a field patch for one remote document
    pub fn enqueue_patch(&self, collection: Collection, id: impl Into<String>, patch: FieldPatch) {
        self.send(SyncCommand::Patch {
            collection,
            id: id.into(),
            patch,
        });
    }

    /// Queues a local cache save
    pub fn enqueue_persist(&self, collections: CachedCollections) {
        self.send(SyncCommand::Persist(collections));
    }

    /// Waits until every command queued before this call has been handled
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        if sender.send(SyncCommand::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Number of writes that failed since the worker started
    pub fn failure_count(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Number of writes that succeeded since the worker started
    pub fn completed_count(&self) -> u64 {
        self.counters.completed.load(Ordering::Relaxed)
    }

    fn send(&self, command: SyncCommand) {
        match &self.sender {
            Some(sender) => {
                if sender.send(command).is_err() {
                    warn!("sync worker has stopped, dropping write");
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            None => debug!("detached sync handle, dropping write"),
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<SyncCommand>,
    remote: RemoteSync,
    cache: Option<Arc<dyn LocalCache>>,
    counters: Arc<SyncCounters>,
) {
    debug!(remote = remote.is_configured(), cache = cache.is_some(), "sync worker started");

    while let Some(command) = rx.recv().await {
        match command {
            SyncCommand::Patch {
                collection,
                id,
                patch,
            } => match remote.update_field(collection, &id, &patch).await {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                    debug!(collection = %collection, id = %id, "remote patch applied");
                }
                Err(err) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(collection = %collection, id = %id, error = %err, "remote patch failed");
                }
            },
            SyncCommand::Persist(collections) => {
                let Some(cache) = &cache else {
                    continue;
                };
                match cache.save(&collections).await {
                    Ok(()) => {
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %err, "local cache save failed");
                    }
                }
            }
            SyncCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("sync worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;
    use crate::storage::FileCache;
    use serde_json::json;
    use tempfile::TempDir;

    fn status_patch(status: &str) -> FieldPatch {
        let mut patch = FieldPatch::new();
        patch.insert("status".to_string(), json!(status));
        patch
    }

    #[tokio::test]
    async fn test_patches_applied_in_order() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(Collection::Tasks, "t1", json!({"status": "todo"}));
        let handle = SyncHandle::spawn(RemoteSync::new(backend.clone()), None).unwrap();

        handle.enqueue_patch(Collection::Tasks, "t1", status_patch("review"));
        handle.enqueue_patch(Collection::Tasks, "t1", status_patch("done"));
        handle.flush().await;

        assert_eq!(backend.document(Collection::Tasks, "t1").unwrap()["status"], "done");
        assert_eq!(handle.completed_count(), 2);
        assert_eq!(handle.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_patch_is_counted() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(Collection::Tasks, "t1", json!({}));
        backend.set_fail_writes(true);
        let handle = SyncHandle::spawn(RemoteSync::new(backend), None).unwrap();

        handle.enqueue_patch(Collection::Tasks, "t1", status_patch("done"));
        handle.enqueue_patch(Collection::Tasks, "missing", status_patch("done"));
        handle.flush().await;

        assert_eq!(handle.failure_count(), 2);
    }

    #[tokio::test]
    async fn test_persist_writes_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCache::new(temp_dir.path()));
        let handle = SyncHandle::spawn(RemoteSync::unconfigured(), Some(cache.clone() as Arc<dyn LocalCache>)).unwrap();

        let snapshot = CachedCollections::new(crate::sample::sample_tasks(), Vec::new());
        handle.enqueue_persist(snapshot.clone());
        handle.flush().await;

        assert_eq!(cache.load().await.unwrap(), Some(snapshot));
    }

    #[test]
    fn test_spawn_requires_runtime() {
        let result = SyncHandle::spawn(RemoteSync::unconfigured(), None);
        assert!(matches!(result, Err(NexusError::RuntimeUnavailable)));
    }

    #[tokio::test]
    async fn test_detached_handle_discards() {
        let handle = SyncHandle::detached();
        handle.enqueue_patch(Collection::Tasks, "t1", status_patch("done"));
        handle.flush().await;

        assert!(handle.is_detached());
        assert_eq!(handle.failure_count(), 0);
    }
}
