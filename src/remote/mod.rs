use crate::domain::{Project, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub mod client;
#[cfg(feature = "firestore")]
pub mod firestore;
pub mod memory;
pub mod normalize;

pub use client::{BoardPayload, RemoteSync, Subscription};
#[cfg(feature = "firestore")]
pub use firestore::FirestoreBackend;
pub use memory::MemoryBackend;

/// Named document collections in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Tasks,
    Projects,
    Deals,
    Clients,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Projects => "projects",
            Self::Deals => "deals",
            Self::Clients => "clients",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a payload's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Remote,
    /// Last snapshot saved by the local cache
    Cache,
    #[default]
    Mock,
}

/// Full snapshot of the task and project collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksPayload {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub source: DataSource,
}

impl TasksPayload {
    /// The built-in sample dataset
    pub fn mock() -> Self {
        Self {
            tasks: crate::sample::sample_tasks(),
            projects: crate::sample::sample_projects(),
            source: DataSource::Mock,
        }
    }
}

/// A raw document as stored remotely; `data` holds plain JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub data: Value,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Field patch applied to a single document
pub type FieldPatch = Map<String, Value>;

/// Transport to a hosted document store.
///
/// Implementations report transport failures as `anyhow` errors; the sync
/// layer decides whether they are swallowed or surfaced.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Lists every document of a collection
    async fn list_documents(&self, collection: Collection) -> anyhow::Result<Vec<RemoteDocument>>;

    /// Merges the patch into an existing document
    async fn update_document(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
    ) -> anyhow::Result<()>;
}
