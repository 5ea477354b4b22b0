//! Retrieval: embed the query, then similarity-search the vector index.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::{EmbeddingClient, IndexMatch, VectorIndexClient};
use crate::pipeline::state::Document;
use crate::types::MetadataFilter;

/// Fetches the top-k passages for a query, scoped by namespace and a
/// server-side metadata filter.
///
/// Fails soft: an embedding or index fault yields an empty result set, which
/// the orchestrator treats as "no evidence", never as an error to surface.
pub struct Retriever {
    embedding: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndexClient>,
    top_k: usize,
}

impl Retriever {
    pub const DEFAULT_TOP_K: usize = 3;

    #[must_use]
    pub fn new(embedding: Arc<dyn EmbeddingClient>, index: Arc<dyn VectorIndexClient>) -> Self {
        Self {
            embedding,
            index,
            top_k: Self::DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve candidate documents, ordered by descending similarity as
    /// returned by the index.
    pub async fn retrieve(
        &self,
        query: &str,
        namespace: &str,
        metadata_filter: &MetadataFilter,
    ) -> Vec<Document> {
        let vector = match self.embedding.embed(query).await {
            Ok(vector) => vector,
            Err(error) => {
                warn!(%error, "query embedding failed, returning no candidates");
                return Vec::new();
            }
        };

        let matches = match self
            .index
            .search(&vector, namespace, metadata_filter, self.top_k)
            .await
        {
            Ok(matches) => matches,
            Err(error) => {
                warn!(%error, namespace, "index search failed, returning no candidates");
                return Vec::new();
            }
        };

        debug!(count = matches.len(), namespace, "index search returned matches");
        matches.into_iter().map(document_from_match).collect()
    }
}

/// Map a raw index match into a [`Document`], defaulting missing metadata
/// fields to sentinel placeholders rather than failing.
fn document_from_match(m: IndexMatch) -> Document {
    let content = m
        .metadata
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or(Document::NO_CONTENT);
    let source = m
        .metadata
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or(Document::UNKNOWN_SOURCE);
    Document::new(content, source).with_score(m.score)
}
