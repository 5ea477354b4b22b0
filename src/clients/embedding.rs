//! Text-embedding boundary.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Failure modes of an embedding call.
#[derive(Debug, Error, Diagnostic)]
pub enum EmbeddingError {
    /// Network-level failure reaching the service.
    #[error("embedding request failed: {0}")]
    #[diagnostic(
        code(corrag::clients::embedding_transport),
        help("Check connectivity and the embedding service base URL.")
    )]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status (quota, auth, format).
    #[error("embedding service returned status {status}: {body}")]
    #[diagnostic(code(corrag::clients::embedding_status))]
    Status { status: u16, body: String },

    /// The service answered 200 but returned no vector.
    #[error("embedding response missing vector data")]
    #[diagnostic(code(corrag::clients::embedding_shape))]
    MalformedResponse,
}

/// A text-embedding service: turns text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// OpenAI-compatible `embeddings` client.
pub struct OpenAiEmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddingClient {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status, body });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or(EmbeddingError::MalformedResponse)
    }
}
