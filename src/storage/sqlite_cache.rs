use crate::{
    error::{NexusError, Result},
    storage::{CachedCollections, LocalCache, CACHE_NAMESPACE},
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
    namespace TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at TEXT NOT NULL
)";

fn storage_error(err: rusqlite::Error) -> NexusError {
    NexusError::StorageError(err.to_string())
}

/// SQLite-backed cache storing the snapshot as JSON in `cache_entries`
#[derive(Clone)]
pub struct SqliteCache {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCache {
    /// Opens (or creates) the database file and its schema
    pub fn open(database_path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(database_path).map_err(storage_error)?;
        Self::with_connection(connection)
    }

    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(storage_error)?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection.execute(SCHEMA, []).map_err(storage_error)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let guard = connection
                .lock()
                .map_err(|_| NexusError::StorageError("cache connection lock poisoned".to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|e| NexusError::StorageError(format!("join error: {}", e)))?
    }
}

#[async_trait]
impl LocalCache for SqliteCache {
    async fn load(&self) -> Result<Option<CachedCollections>> {
        let payload: Option<String> = self
            .run(|conn| {
                conn.query_row(
                    "SELECT payload FROM cache_entries WHERE namespace = ?1",
                    params![CACHE_NAMESPACE],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error)
            })
            .await?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        match serde_json::from_str::<CachedCollections>(&payload) {
            Ok(mut cached) => {
                for task in &mut cached.tasks {
                    task.ensure_checklist_ids();
                }
                Ok(Some(cached))
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable cache entry");
                Ok(None)
            }
        }
    }

    async fn save(&self, collections: &CachedCollections) -> Result<()> {
        let payload = serde_json::to_string(collections)?;
        let saved_at = collections.saved_at.to_rfc3339();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO cache_entries (namespace, payload, saved_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(namespace) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at",
                params![CACHE_NAMESPACE, payload, saved_at],
            )
            .map_err(storage_error)?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.run(|conn| {
            conn.execute(
                "DELETE FROM cache_entries WHERE namespace = ?1",
                params![CACHE_NAMESPACE],
            )
            .map_err(storage_error)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{sample_projects, sample_tasks};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_cache_loads_none() {
        let cache = SqliteCache::in_memory().unwrap();
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_and_clear() {
        let cache = SqliteCache::in_memory().unwrap();
        let collections = CachedCollections::new(sample_tasks(), sample_projects());

        cache.save(&collections).await.unwrap();
        cache.save(&collections).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(collections));

        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache.db");
        let collections = CachedCollections::new(sample_tasks(), Vec::new());

        SqliteCache::open(&path)
            .unwrap()
            .save(&collections)
            .await
            .unwrap();

        let reopened = SqliteCache::open(&path).unwrap();
        assert_eq!(reopened.load().await.unwrap(), Some(collections));
    }
}
