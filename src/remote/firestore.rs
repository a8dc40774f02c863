//! Firestore REST v1 backend.
//!
//! Documents travel as typed Firestore values (`stringValue`, `mapValue`,
//! ...); this module converts them to and from plain JSON so the rest of
//! the crate only sees `serde_json::Value`.

use crate::config::RemoteConfig;
use crate::remote::{Collection, FieldPatch, RemoteBackend, RemoteDocument};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

const FIRESTORE_HOST: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore access through the public REST API, authenticated by API key
pub struct FirestoreBackend {
    http: reqwest::Client,
    documents_url: String,
    api_key: String,
}

impl FirestoreBackend {
    pub fn new(config: &RemoteConfig) -> Self {
        Self::with_base_url(
            config,
            format!(
                "{}/projects/{}/databases/(default)/documents",
                FIRESTORE_HOST, config.project_id
            ),
        )
    }

    /// Points the backend at a different documents root, such as an emulator
    pub fn with_base_url(config: &RemoteConfig, documents_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            documents_url,
            api_key: config.api_key.clone(),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url, collection.as_str())
    }

    /// URL of one document; the id is percent-encoded as a single path segment
    fn document_url(&self, collection: Collection, id: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.collection_url(collection))
            .with_context(|| format!("invalid documents url {}", self.documents_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("documents url {} cannot take a path", self.documents_url))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl RemoteBackend for FirestoreBackend {
    async fn list_documents(&self, collection: Collection) -> anyhow::Result<Vec<RemoteDocument>> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("key", self.api_key.as_str()), ("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .query(&query)
                .send()
                .await
                .with_context(|| format!("listing {}", collection))?;
            if !response.status().is_success() {
                bail!("listing {} failed with HTTP {}", collection, response.status());
            }

            let page: ListResponse = response
                .json()
                .await
                .with_context(|| format!("decoding {} page", collection))?;
            documents.extend(page.documents.into_iter().map(|doc| {
                let id = document_id(&doc.name).to_string();
                RemoteDocument::new(id, decode_fields(&doc.fields))
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(collection = %collection, count = documents.len(), "listed remote documents");
        Ok(documents)
    }

    async fn update_document(
        &self,
        collection: Collection,
        id: &str,
        patch: &FieldPatch,
    ) -> anyhow::Result<()> {
        let url = self.document_url(collection, id)?;
        let mut query = vec![
            ("key", self.api_key.clone()),
            ("currentDocument.exists", "true".to_string()),
        ];
        query.extend(patch.keys().map(|field| ("updateMask.fieldPaths", field.clone())));

        let body = json!({ "fields": encode_fields(patch) });
        let response = self
            .http
            .patch(url)
            .query(&query)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("patching {}/{}", collection, id))?;
        if !response.status().is_success() {
            bail!(
                "patching {}/{} failed with HTTP {}",
                collection,
                id,
                response.status()
            );
        }
        Ok(())
    }
}

/// Last path segment of a full document resource name
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Converts a Firestore `fields` map into a plain JSON object
pub fn decode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), decode_value(value)))
            .collect(),
    )
}

/// Converts one typed Firestore value into plain JSON
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|map| map.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_else(|| Value::Object(Map::new())),
        _ => Value::Null,
    }
}

/// Converts a plain JSON object into a Firestore `fields` map
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Converts plain JSON into one typed Firestore value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}
