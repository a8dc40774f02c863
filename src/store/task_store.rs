use crate::domain::calendar::resolve_calendar_drop;
use crate::domain::{Project, ProjectId, Task, TaskId, TaskStats, TaskStatus};
use crate::error::{NexusError, Result};
use crate::remote::{Collection, DataSource, FieldPatch, RemoteSync, Subscription, TasksPayload};
use crate::sample::{sample_projects, sample_tasks};
use crate::storage::{CachedCollections, LocalCache};
use crate::store::SyncHandle;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Notice shown while running on sample data without a remote
pub const UNCONFIGURED_NOTICE: &str = "Remote store not configured. Using sample data.";

/// Notice shown when a configured remote could not supply data
pub const FALLBACK_NOTICE: &str = "Remote store unavailable. Using sample data.";

/// Snapshot of the task tracker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TasksState {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub loading: bool,
    pub initialized: bool,
    /// Non-blocking notice for the user, if any
    pub error: Option<String>,
    pub source: DataSource,
}

impl TasksState {
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == id)
    }

    /// Tasks in one status bucket, in collection order
    pub fn tasks_with_status(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.status == status).collect()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }
}

struct Inner {
    state: watch::Sender<Arc<TasksState>>,
    remote: RemoteSync,
    sync: SyncHandle,
}

/// Observable task store with optimistic, fire-and-forget sync.
///
/// Every mutation is applied locally first and subscribers are notified;
/// the matching remote patch and a cache save are then queued on the sync
/// worker. Write failures never roll local state back.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<Inner>,
}

impl TaskStore {
    /// Creates a store seeded with the sample data
    pub fn new(remote: RemoteSync, sync: SyncHandle) -> Self {
        let configured = remote.is_configured();
        let state = TasksState {
            tasks: sample_tasks(),
            projects: sample_projects(),
            loading: false,
            initialized: !configured,
            error: (!configured).then(|| UNCONFIGURED_NOTICE.to_string()),
            source: DataSource::Mock,
        };
        let (tx, _rx) = watch::channel(Arc::new(state));

        Self {
            inner: Arc::new(Inner {
                state: tx,
                remote,
                sync,
            }),
        }
    }

    /// Creates a store seeded from the local cache when it holds a snapshot
    pub async fn open(remote: RemoteSync, sync: SyncHandle, cache: &dyn LocalCache) -> Self {
        let store = Self::new(remote, sync);
        match cache.load().await {
            Ok(Some(cached)) => {
                info!(tasks = cached.tasks.len(), saved_at = %cached.saved_at, "restored tasks from local cache");
                store.inner.state.send_modify(|state| {
                    let state = Arc::make_mut(state);
                    state.tasks = cached.tasks;
                    state.projects = cached.projects;
                    state.source = DataSource::Cache;
                });
            }
            Ok(None) => debug!("no local cache, starting from sample data"),
            Err(err) => warn!(error = %err, "failed to read local cache, starting from sample data"),
        }
        store
    }

    pub fn snapshot(&self) -> Arc<TasksState> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TasksState>> {
        self.inner.state.subscribe()
    }

    pub fn sync_handle(&self) -> &SyncHandle {
        &self.inner.sync
    }

    /// Loads tasks and projects from the remote once.
    ///
    /// Does nothing without a remote, or when a load is running or done.
    pub async fn init(&self) {
        if !self.inner.remote.is_configured() {
            return;
        }

        let started = self.inner.state.send_if_modified(|state| {
            if state.loading || state.initialized {
                return false;
            }
            let state = Arc::make_mut(state);
            state.loading = true;
            state.error = None;
            true
        });
        if !started {
            return;
        }

        let payload = self.inner.remote.fetch_all().await;
        if !self.install(payload, false) {
            debug!("a remote snapshot arrived during init, discarding the initial fetch");
        }
    }

    /// Starts a remote subscription whose snapshots replace the collections
    pub fn attach(&self) -> Subscription {
        let on_data = self.clone();
        let on_error = self.clone();
        self.inner.remote.subscribe(
            move |payload| on_data.apply_payload(payload),
            move |err| on_error.report_error(&err),
        )
    }

    /// Replaces tasks and projects with a fetched or pushed snapshot
    pub fn apply_payload(&self, payload: TasksPayload) {
        self.install(payload, true);
    }

    /// Installs a payload; without `overwrite` an initialized state is kept.
    /// Returns whether the payload was applied.
    fn install(&self, payload: TasksPayload, overwrite: bool) -> bool {
        let configured = self.inner.remote.is_configured();
        let TasksPayload {
            mut tasks,
            projects,
            source,
        } = payload;
        for task in &mut tasks {
            task.ensure_checklist_ids();
        }

        let applied = self.inner.state.send_if_modified(|state| {
            if !overwrite && state.initialized {
                return false;
            }
            let state = Arc::make_mut(state);
            state.tasks = tasks;
            state.projects = projects;
            state.loading = false;
            state.initialized = true;
            state.source = source;
            state.error = match (configured, source) {
                (false, _) => Some(UNCONFIGURED_NOTICE.to_string()),
                (true, DataSource::Mock) => Some(FALLBACK_NOTICE.to_string()),
                (true, _) => None,
            };
            true
        });
        if applied {
            debug!(source = ?source, "applied task payload");
            self.persist();
        }
        applied
    }

    pub fn update_task_status(&self, task_id: &TaskId, status: TaskStatus) -> Result<()> {
        let changed = self.update_task(task_id, |task| {
            if task.status == status {
                return Ok(None);
            }
            task.status = status;
            Ok(Some(()))
        })?;

        if changed.is_some() {
            let mut patch = FieldPatch::new();
            patch.insert("status".to_string(), json!(status.as_str()));
            self.push(task_id, patch);
        }
        Ok(())
    }

    /// Flips the first checklist item with this label; returns its new state
    pub fn toggle_checklist_item(&self, task_id: &TaskId, label: &str) -> Result<bool> {
        self.toggle_with(task_id, |task| {
            task.toggle_checklist_item(label).map(|item| item.completed)
        })
    }

    /// Flips the checklist item with this id; returns its new state
    pub fn toggle_checklist_item_by_id(&self, task_id: &TaskId, item_id: Uuid) -> Result<bool> {
        self.toggle_with(task_id, |task| {
            task.toggle_checklist_item_by_id(item_id).map(|item| item.completed)
        })
    }

    pub fn update_task_due_date(&self, task_id: &TaskId, due_date: NaiveDate) -> Result<()> {
        let changed = self.update_task(task_id, |task| {
            if task.due_date == due_date {
                return Ok(None);
            }
            task.due_date = due_date;
            Ok(Some(()))
        })?;

        if changed.is_some() {
            let mut patch = FieldPatch::new();
            patch.insert(
                "dueDate".to_string(),
                json!(due_date.format("%Y-%m-%d").to_string()),
            );
            self.push(task_id, patch);
        }
        Ok(())
    }

    /// Reschedules a task dropped on a calendar cell such as `day:2025-01-20`.
    ///
    /// Returns the new due date, or `None` when the drop changed nothing.
    pub fn reschedule_from_drop(&self, task_id: &TaskId, drop_id: &str) -> Result<Option<NaiveDate>> {
        let snapshot = self.snapshot();
        if snapshot.task(task_id).is_none() {
            return Err(NexusError::TaskNotFound(task_id.to_string()));
        }

        match resolve_calendar_drop(&snapshot.tasks, task_id, drop_id) {
            Some(date) => {
                self.update_task_due_date(task_id, date)?;
                Ok(Some(date))
            }
            None => Ok(None),
        }
    }

    fn toggle_with(
        &self,
        task_id: &TaskId,
        toggle: impl FnOnce(&mut Task) -> Result<bool>,
    ) -> Result<bool> {
        let toggled = self.update_task(task_id, |task| {
            let completed = toggle(task)?;
            Ok(Some((completed, task.checklist.clone())))
        })?;

        let Some((completed, checklist)) = toggled else {
            return Ok(false);
        };
        let mut patch = FieldPatch::new();
        patch.insert("checklist".to_string(), serde_json::to_value(&checklist)?);
        self.push(task_id, patch);
        Ok(completed)
    }

    /// Applies `apply` to a copy of one task and commits it when it
    /// reports a change. Unchanged or failed updates keep the snapshot.
    fn update_task<R>(
        &self,
        task_id: &TaskId,
        apply: impl FnOnce(&mut Task) -> Result<Option<R>>,
    ) -> Result<Option<R>> {
        let mut outcome = Ok(None);
        self.inner.state.send_if_modified(|state| {
            let Some(index) = state.tasks.iter().position(|task| &task.id == task_id) else {
                outcome = Err(NexusError::TaskNotFound(task_id.to_string()));
                return false;
            };

            let mut task = state.tasks[index].clone();
            match apply(&mut task) {
                Ok(Some(value)) => {
                    Arc::make_mut(state).tasks[index] = task;
                    outcome = Ok(Some(value));
                    true
                }
                other => {
                    outcome = other;
                    false
                }
            }
        });
        outcome
    }

    fn push(&self, task_id: &TaskId, patch: FieldPatch) {
        debug!(task = %task_id, fields = ?patch.keys().collect::<Vec<_>>(), "queueing task patch");
        self.inner
            .sync
            .enqueue_patch(Collection::Tasks, task_id.as_str(), patch);
        self.persist();
    }

    fn persist(&self) {
        let snapshot = self.snapshot();
        self.inner.sync.enqueue_persist(CachedCollections::new(
            snapshot.tasks.clone(),
            snapshot.projects.clone(),
        ));
    }

    fn report_error(&self, err: &NexusError) {
        let message = err.to_string();
        self.inner.state.send_if_modified(|state| {
            if state.error.as_deref() == Some(message.as_str()) {
                return false;
            }
            Arc::make_mut(state).error = Some(message);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryBackend, RemoteBackend, RemoteDocument};
    use crate::storage::FileCache;
    use tempfile::TempDir;

    fn offline_store() -> TaskStore {
        TaskStore::new(RemoteSync::unconfigured(), SyncHandle::detached())
    }

    fn single_item_task() -> Task {
        let mut task = Task::new(
            TaskId::from("t1"),
            "Checklist".to_string(),
            ProjectId::from("project-1"),
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
        );
        task.add_checklist_item("X".to_string());
        task
    }

    #[test]
    fn test_unconfigured_store_starts_initialized_with_notice() {
        let state = offline_store().snapshot();

        assert!(state.initialized);
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some(UNCONFIGURED_NOTICE));
        assert_eq!(state.source, DataSource::Mock);
        assert_eq!(state.tasks, sample_tasks());
    }

    #[test]
    fn test_update_task_status() {
        let store = offline_store();
        let id = TaskId::from("task-3");

        store.update_task_status(&id, TaskStatus::Done).unwrap();

        let state = store.snapshot();
        assert_eq!(state.task(&id).unwrap().status, TaskStatus::Done);
        assert!(state.tasks_with_status(TaskStatus::Done).iter().any(|t| t.id == id));
    }

    #[test]
    fn test_unchanged_status_keeps_snapshot() {
        let store = offline_store();
        let before = store.snapshot();

        store
            .update_task_status(&TaskId::from("task-3"), TaskStatus::Todo)
            .unwrap();

        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_unknown_task_rejected() {
        let store = offline_store();
        let before = store.snapshot();
        let missing = TaskId::from("nope");

        assert!(matches!(
            store.update_task_status(&missing, TaskStatus::Done),
            Err(NexusError::TaskNotFound(_))
        ));
        assert!(matches!(
            store.toggle_checklist_item(&missing, "X"),
            Err(NexusError::TaskNotFound(_))
        ));
        assert!(matches!(
            store.reschedule_from_drop(&missing, "day:2025-01-01"),
            Err(NexusError::TaskNotFound(_))
        ));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_toggle_checklist_involution() {
        let store = offline_store();
        store.apply_payload(TasksPayload {
            tasks: vec![single_item_task()],
            projects: sample_projects(),
            source: DataSource::Mock,
        });
        let id = TaskId::from("t1");

        assert!(store.toggle_checklist_item(&id, "X").unwrap());
        assert!(store.snapshot().task(&id).unwrap().checklist[0].completed);

        assert!(!store.toggle_checklist_item(&id, "X").unwrap());
        assert!(!store.snapshot().task(&id).unwrap().checklist[0].completed);
    }

    #[test]
    fn test_toggle_unknown_label_rejected() {
        let store = offline_store();
        let before = store.snapshot();

        let err = store
            .toggle_checklist_item(&TaskId::from("task-1"), "No such item")
            .unwrap_err();

        assert!(matches!(err, NexusError::ChecklistItemNotFound { .. }));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_toggle_by_id_distinguishes_duplicate_labels() {
        let store = offline_store();
        let mut task = single_item_task();
        let second = task.add_checklist_item("X".to_string());
        store.apply_payload(TasksPayload {
            tasks: vec![task],
            projects: Vec::new(),
            source: DataSource::Mock,
        });
        let id = TaskId::from("t1");

        assert!(store.toggle_checklist_item_by_id(&id, second).unwrap());
        let state = store.snapshot();
        let checklist = &state.task(&id).unwrap().checklist;
        assert!(!checklist[0].completed);
        assert!(checklist[1].completed);

        assert!(store.toggle_checklist_item(&id, "X").unwrap());
        let state = store.snapshot();
        assert!(state.task(&id).unwrap().checklist.iter().all(|item| item.completed));
    }

    #[test]
    fn test_reschedule_from_drop() {
        let store = offline_store();
        let id = TaskId::from("task-1");

        let date = store.reschedule_from_drop(&id, "day:2025-01-31").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(store.snapshot().task(&id).unwrap().due_date, date.unwrap());

        assert_eq!(store.reschedule_from_drop(&id, "day:2025-01-31").unwrap(), None);
        assert_eq!(store.reschedule_from_drop(&id, "column:todo").unwrap(), None);
    }

    #[tokio::test]
    async fn test_mutations_patch_remote() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .seed(Collection::Tasks, &sample_tasks(), |t| t.id.to_string())
            .unwrap();
        let remote = RemoteSync::new(backend.clone());
        let sync = SyncHandle::spawn(remote.clone(), None).unwrap();
        let store = TaskStore::new(remote, sync.clone());
        let id = TaskId::from("task-2");

        store.update_task_status(&id, TaskStatus::Done).unwrap();
        store.toggle_checklist_item(&id, "Challenges screen").unwrap();
        store
            .update_task_due_date(&id, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap())
            .unwrap();
        sync.flush().await;

        let doc = backend.document(Collection::Tasks, "task-2").unwrap();
        assert_eq!(doc["status"], "done");
        assert_eq!(doc["dueDate"], "2025-02-03");
        assert_eq!(doc["checklist"][1]["completed"], true);
        assert_eq!(sync.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_change() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_writes(true);
        let remote = RemoteSync::new(backend);
        let sync = SyncHandle::spawn(remote.clone(), None).unwrap();
        let store = TaskStore::new(remote, sync.clone());
        let id = TaskId::from("task-7");

        store.update_task_status(&id, TaskStatus::Review).unwrap();
        sync.flush().await;

        assert_eq!(sync.failure_count(), 1);
        assert_eq!(store.snapshot().task(&id).unwrap().status, TaskStatus::Review);
    }

    #[tokio::test]
    async fn test_init_loads_remote_once() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(
            Collection::Tasks,
            "r1",
            json!({"title": "Remote", "projectId": "project-1", "dueDate": "2025-03-01"}),
        );
        let store = TaskStore::new(RemoteSync::new(backend.clone()), SyncHandle::detached());
        assert!(!store.snapshot().initialized);

        store.init().await;
        let state = store.snapshot();
        assert!(state.initialized);
        assert!(!state.loading);
        assert_eq!(state.source, DataSource::Remote);
        assert_eq!(state.error, None);
        assert_eq!(state.tasks.len(), 1);

        backend.insert(Collection::Tasks, "r2", json!({"title": "Later"}));
        store.init().await;
        assert_eq!(store.snapshot().tasks.len(), 1);
    }

    /// Backend whose reads wait until the test releases them
    struct GatedBackend {
        inner: MemoryBackend,
        gate: tokio::sync::Semaphore,
    }

    #[async_trait::async_trait]
    impl RemoteBackend for GatedBackend {
        async fn list_documents(&self, collection: Collection) -> anyhow::Result<Vec<RemoteDocument>> {
            let _permit = self.gate.acquire().await?;
            self.inner.list_documents(collection).await
        }

        async fn update_document(
            &self,
            collection: Collection,
            id: &str,
            patch: &FieldPatch,
        ) -> anyhow::Result<()> {
            self.inner.update_document(collection, id, patch).await
        }
    }

    #[tokio::test]
    async fn test_init_keeps_snapshot_delivered_while_loading() {
        let backend = Arc::new(GatedBackend {
            inner: MemoryBackend::new(),
            gate: tokio::sync::Semaphore::new(0),
        });
        backend.inner.insert(
            Collection::Tasks,
            "stale",
            json!({"title": "Stale", "projectId": "project-1", "dueDate": "2025-03-01"}),
        );
        let store = TaskStore::new(RemoteSync::new(backend.clone()), SyncHandle::detached());

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.init().await }
        });
        while !store.snapshot().loading {
            tokio::task::yield_now().await;
        }

        store.apply_payload(TasksPayload {
            tasks: vec![single_item_task()],
            projects: sample_projects(),
            source: DataSource::Remote,
        });
        backend.gate.add_permits(2);
        pending.await.unwrap();

        let state = store.snapshot();
        assert!(state.initialized);
        assert!(!state.loading);
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].id, TaskId::from("t1"));
    }

    #[tokio::test]
    async fn test_init_fallback_sets_notice() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_fail_reads(true);
        let store = TaskStore::new(RemoteSync::new(backend), SyncHandle::detached());

        store.init().await;

        let state = store.snapshot();
        assert!(state.initialized);
        assert_eq!(state.source, DataSource::Mock);
        assert_eq!(state.error.as_deref(), Some(FALLBACK_NOTICE));
    }

    #[tokio::test]
    async fn test_open_prefers_local_cache_and_persists_changes() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCache::new(temp_dir.path()));
        let mut cached_tasks = sample_tasks();
        cached_tasks.truncate(2);
        cache
            .save(&CachedCollections::new(cached_tasks, sample_projects()))
            .await
            .unwrap();

        let remote = RemoteSync::unconfigured();
        let sync = SyncHandle::spawn(remote.clone(), Some(cache.clone() as Arc<dyn LocalCache>)).unwrap();
        let store = TaskStore::open(remote, sync.clone(), cache.as_ref()).await;

        let state = store.snapshot();
        assert_eq!(state.source, DataSource::Cache);
        assert_eq!(state.tasks.len(), 2);

        store
            .update_task_status(&TaskId::from("task-1"), TaskStatus::Done)
            .unwrap();
        sync.flush().await;

        let saved = cache.load().await.unwrap().unwrap();
        assert_eq!(saved.tasks[0].status, TaskStatus::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_applies_remote_snapshots() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(Collection::Projects, "p1", json!({"name": "Remote project"}));
        let remote = RemoteSync::new(backend.clone()).with_poll_interval(std::time::Duration::from_secs(5));
        let store = TaskStore::new(remote, SyncHandle::detached());

        let subscription = store.attach();
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;

        let state = store.snapshot();
        assert_eq!(state.source, DataSource::Remote);
        assert!(state.tasks.is_empty());
        assert_eq!(state.projects.len(), 1);
        assert!(state.initialized);

        backend.set_fail_reads(true);
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert!(store.snapshot().error.is_some());

        subscription.unsubscribe();
    }
}
