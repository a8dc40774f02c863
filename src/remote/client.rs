use crate::config::MIN_POLL_INTERVAL;
use crate::domain::{Client, Deal};
use crate::error::NexusError;
use crate::remote::normalize::{normalize_client, normalize_deal, normalize_project, normalize_task};
use crate::remote::{Collection, DataSource, FieldPatch, RemoteBackend, RemoteDocument, TasksPayload};
use crate::sample;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Deal board snapshot read from the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct BoardPayload {
    pub deals: Vec<Deal>,
    pub clients: Vec<Client>,
    pub source: DataSource,
}

impl BoardPayload {
    pub fn mock() -> Self {
        Self {
            deals: sample::sample_deals(),
            clients: sample::sample_clients(),
            source: DataSource::Mock,
        }
    }
}

/// Handle to a running remote subscription.
///
/// Dropping it stops the polling task, as does `unsubscribe`.
#[derive(Debug, Default)]
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    fn inert() -> Self {
        Self { handle: None }
    }

    /// True while a polling task is attached
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("remote subscription cancelled");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Sync client over an optional remote backend.
///
/// Without a backend every read returns the built-in sample data and every
/// write is a no-op, so callers never need to branch on configuration.
#[derive(Clone)]
pub struct RemoteSync {
    backend: Option<Arc<dyn RemoteBackend>>,
    poll_interval: Duration,
}

impl RemoteSync {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self {
            backend: Some(backend),
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Builds a Firestore-backed client, or an unconfigured one when keys are missing
    #[cfg(feature = "firestore")]
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        if !config.remote.is_configured() {
            return Self::unconfigured().with_poll_interval(config.poll_interval);
        }
        info!(project = %config.remote.project_id, "using Firestore remote");
        let backend = crate::remote::FirestoreBackend::new(&config.remote);
        Self::new(Arc::new(backend)).with_poll_interval(config.poll_interval)
    }

    /// Sets the subscription poll period, raised to `MIN_POLL_INTERVAL` if shorter
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            warn!(requested = ?interval, "poll interval too short, using {:?}", MIN_POLL_INTERVAL);
        }
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Reads tasks and projects, falling back to sample data.
    ///
    /// Never fails: transport errors are logged and replaced by the samples.
    pub async fn fetch_all(&self) -> TasksPayload {
        let Some(backend) = &self.backend else {
            return TasksPayload::mock();
        };

        let result = tokio::try_join!(
            backend.list_documents(Collection::Tasks),
            backend.list_documents(Collection::Projects)
        );
        match result {
            Ok((tasks, projects)) => {
                if tasks.is_empty() && projects.is_empty() {
                    return TasksPayload::mock();
                }
                let mut payload = tasks_payload(&tasks, &projects, today());
                if payload.tasks.is_empty() {
                    payload.tasks = sample::sample_tasks();
                }
                if payload.projects.is_empty() {
                    payload.projects = sample::sample_projects();
                }
                payload
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks from remote, using sample data");
                TasksPayload::mock()
            }
        }
    }

    /// Reads deals and clients with the same fallback rules as `fetch_all`
    pub async fn fetch_board(&self) -> BoardPayload {
        let Some(backend) = &self.backend else {
            return BoardPayload::mock();
        };

        let result = tokio::try_join!(
            backend.list_documents(Collection::Deals),
            backend.list_documents(Collection::Clients)
        );
        match result {
            Ok((deals, clients)) if deals.is_empty() && clients.is_empty() => BoardPayload::mock(),
            Ok((deals, clients)) => BoardPayload {
                deals: if deals.is_empty() {
                    sample::sample_deals()
                } else {
                    deals.iter().map(|d| normalize_deal(&d.id, &d.data)).collect()
                },
                clients: if clients.is_empty() {
                    sample::sample_clients()
                } else {
                    clients.iter().map(|c| normalize_client(&c.id, &c.data)).collect()
                },
                source: DataSource::Remote,
            },
            Err(err) => {
                warn!(error = %err, "failed to load deals from remote, using sample data");
                BoardPayload::mock()
            }
        }
    }

    /// Starts delivering task/project snapshots.
    ///
    /// Unconfigured clients deliver the sample payload once and return an
    /// inert subscription. Configured clients poll both collections and call
    /// `on_data` with the full snapshot whenever either one changed; backend
    /// errors go to `on_error` and polling continues.
    pub fn subscribe<D, E>(&self, mut on_data: D, mut on_error: E) -> Subscription
    where
        D: FnMut(TasksPayload) + Send + 'static,
        E: FnMut(NexusError) + Send + 'static,
    {
        let Some(backend) = self.backend.clone() else {
            on_data(TasksPayload::mock());
            return Subscription::inert();
        };

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                on_error(NexusError::RuntimeUnavailable);
                return Subscription::inert();
            }
        };

        let poll_interval = self.poll_interval;
        info!(interval = ?poll_interval, "starting remote subscription");
        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_seen: Option<(Vec<RemoteDocument>, Vec<RemoteDocument>)> = None;

            loop {
                ticker.tick().await;
                let result = tokio::try_join!(
                    backend.list_documents(Collection::Tasks),
                    backend.list_documents(Collection::Projects)
                );
                match result {
                    Ok((tasks, projects)) => {
                        let changed = last_seen
                            .as_ref()
                            .map_or(true, |(t, p)| *t != tasks || *p != projects);
                        if changed {
                            debug!(tasks = tasks.len(), projects = projects.len(), "remote snapshot changed");
                            on_data(tasks_payload(&tasks, &projects, today()));
                            last_seen = Some((tasks, projects));
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "remote subscription poll failed");
                        on_error(NexusError::Remote(err));
                    }
                }
            }
        });

        Subscription {
            handle: Some(handle),
        }
    }

    /// Merges `patch` into one remote document; a no-op when unconfigured
    pub async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
    ) -> anyhow::Result<()> {
        match &self.backend {
            Some(backend) => backend.update_document(collection, id, patch).await,
            None => Ok(()),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Normalized snapshot of both collections, exactly as stored
fn tasks_payload(tasks: &[RemoteDocument], projects: &[RemoteDocument], today: NaiveDate) -> TasksPayload {
    TasksPayload {
        tasks: tasks
            .iter()
            .map(|doc| normalize_task(&doc.id, &doc.data, today))
            .collect(),
        projects: projects
            .iter()
            .map(|doc| normalize_project(&doc.id, &doc.data))
            .collect(),
        source: DataSource::Remote,
    }
}
