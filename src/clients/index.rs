//! Vector-index boundary: similarity search over stored passages.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::types::MetadataFilter;

/// Failure modes of an index query.
#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    /// Network-level failure reaching the index.
    #[error("index request failed: {0}")]
    #[diagnostic(
        code(corrag::clients::index_transport),
        help("Check connectivity and the index host URL.")
    )]
    Transport(#[from] reqwest::Error),

    /// The index answered with a non-success status.
    #[error("index service returned status {status}: {body}")]
    #[diagnostic(code(corrag::clients::index_status))]
    Status { status: u16, body: String },
}

/// One raw similarity match as returned by the index.
///
/// `metadata` is opaque at this layer; the retriever maps well-known keys
/// into [`Document`](crate::pipeline::Document) fields with sentinel
/// defaults. An empty match list is a valid, non-error result.
#[derive(Clone, Debug, Deserialize)]
pub struct IndexMatch {
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub score: f32,
}

/// A similarity-search service over stored vectors.
///
/// `namespace` scopes the search to a logical partition of the index;
/// `filter` is a server-side metadata predicate passed through unmodified.
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    async fn search(
        &self,
        vector: &[f32],
        namespace: &str,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError>;
}

/// Pinecone-style `/query` client.
pub struct PineconeIndexClient {
    http: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndexClient {
    #[must_use]
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[async_trait]
impl VectorIndexClient for PineconeIndexClient {
    async fn search(
        &self,
        vector: &[f32],
        namespace: &str,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        let url = format!("{}/query", self.host.trim_end_matches('/'));
        let mut body = json!({
            "namespace": namespace,
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if !filter.is_empty() {
            let filter_obj: serde_json::Map<String, Value> = filter
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            body["filter"] = Value::Object(filter_obj);
        }

        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Status { status, body });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.matches)
    }
}
