use crate::{
    error::Result,
    storage::{CachedCollections, LocalCache, CACHE_NAMESPACE},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// JSON file cache under `<root>/.nexus/`
pub struct FileCache {
    root_path: PathBuf,
}

impl FileCache {
    const NEXUS_DIR: &'static str = ".nexus";

    /// Creates a cache rooted at the given directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root_path: root.as_ref().join(Self::NEXUS_DIR),
        }
    }

    fn cache_file(&self) -> PathBuf {
        self.root_path.join(format!("{}.json", CACHE_NAMESPACE))
    }

    fn temp_file(&self) -> PathBuf {
        self.root_path.join(format!("{}.json.tmp", CACHE_NAMESPACE))
    }

    async fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_path.exists() {
            fs::create_dir_all(&self.root_path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LocalCache for FileCache {
    async fn load(&self) -> Result<Option<CachedCollections>> {
        let path = self.cache_file();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).await?;
        match serde_json::from_str::<CachedCollections>(&contents) {
            Ok(mut cached) => {
                for task in &mut cached.tasks {
                    task.ensure_checklist_ids();
                }
                debug!(tasks = cached.tasks.len(), "loaded local cache");
                Ok(Some(cached))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable local cache");
                Ok(None)
            }
        }
    }

    async fn save(&self, collections: &CachedCollections) -> Result<()> {
        self.ensure_directory_exists().await?;

        let json = serde_json::to_string_pretty(collections)?;
        let temp = self.temp_file();
        fs::write(&temp, json).await?;
        fs::rename(&temp, self.cache_file()).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let path = self.cache_file();
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}
