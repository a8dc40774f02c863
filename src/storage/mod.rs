use crate::{
    domain::{Project, Task},
    error::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod file_cache;

#[cfg(feature = "sqlite-cache")]
pub mod sqlite_cache;

pub use file_cache::FileCache;
#[cfg(feature = "sqlite-cache")]
pub use sqlite_cache::SqliteCache;

/// Key under which the task collections are cached
pub const CACHE_NAMESPACE: &str = "nexus-tasks";

/// Snapshot of the task collections as last seen locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCollections {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub saved_at: DateTime<Utc>,
}

impl CachedCollections {
    pub fn new(tasks: Vec<Task>, projects: Vec<Project>) -> Self {
        Self {
            tasks,
            projects,
            saved_at: Utc::now(),
        }
    }
}

/// Local persistence for the task collections
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Loads the cached snapshot, if any
    async fn load(&self) -> Result<Option<CachedCollections>>;

    /// Replaces the cached snapshot
    async fn save(&self, collections: &CachedCollections) -> Result<()>;

    /// Removes the cached snapshot
    async fn clear(&self) -> Result<()>;
}
