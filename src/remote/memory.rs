use crate::remote::{Collection, FieldPatch, RemoteBackend, RemoteDocument};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process document store.
///
/// Behaves like the hosted store for listing and field patches, and can be
/// told to fail reads or writes to exercise the fallback paths.
#[derive(Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a whole document
    pub fn insert(&self, collection: Collection, id: impl Into<String>, data: Value) {
        if let Ok(mut collections) = self.collections.lock() {
            collections
                .entry(collection)
                .or_default()
                .insert(id.into(), data);
        }
    }

    /// Inserts serializable records keyed by the given id accessor
    pub fn seed<T: serde::Serialize>(
        &self,
        collection: Collection,
        records: &[T],
        id_of: impl Fn(&T) -> String,
    ) -> anyhow::Result<()> {
        for record in records {
            let mut data = serde_json::to_value(record)?;
            if let Some(map) = data.as_object_mut() {
                map.remove("id");
            }
            self.insert(collection, id_of(record), data);
        }
        Ok(())
    }

    /// Current contents of one document
    pub fn document(&self, collection: Collection, id: &str) -> Option<Value> {
        self.collections
            .lock()
            .ok()?
            .get(&collection)?
            .get(id)
            .cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn list_documents(&self, collection: Collection) -> anyhow::Result<Vec<RemoteDocument>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("simulated read failure on {}", collection);
        }

        let collections = self
            .collections
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| RemoteDocument::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_document(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
    ) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated write failure on {}/{}", collection, id);
        }

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        let document = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| anyhow!("no document {}/{}", collection, id))?;

        if !document.is_object() {
            *document = Value::Object(Default::default());
        }
        if let Some(fields) = document.as_object_mut() {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = MemoryBackend::new();
        backend.insert(Collection::Tasks, "t1", json!({"title": "A", "status": "todo"}));

        let mut patch = FieldPatch::new();
        patch.insert("status".to_string(), json!("done"));
        backend
            .update_document(Collection::Tasks, "t1", &patch)
            .await
            .unwrap();

        assert_eq!(
            backend.document(Collection::Tasks, "t1").unwrap(),
            json!({"title": "A", "status": "done"})
        );
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let backend = MemoryBackend::new();
        let result = backend
            .update_document(Collection::Tasks, "nope", &FieldPatch::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_simulated_failures() {
        let backend = MemoryBackend::new();
        backend.insert(Collection::Projects, "p1", json!({}));

        backend.set_fail_reads(true);
        assert!(backend.list_documents(Collection::Projects).await.is_err());

        backend.set_fail_reads(false);
        assert_eq!(backend.list_documents(Collection::Projects).await.unwrap().len(), 1);

        backend.set_fail_writes(true);
        assert!(backend
            .update_document(Collection::Projects, "p1", &FieldPatch::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_seed_strips_id_field() {
        let backend = MemoryBackend::new();
        let projects = crate::sample::sample_projects();
        backend
            .seed(Collection::Projects, &projects, |p| p.id.to_string())
            .unwrap();

        let doc = backend.document(Collection::Projects, "project-1").unwrap();
        assert!(doc.get("id").is_none());
        assert_eq!(doc["name"], projects[0].name);
    }
}
