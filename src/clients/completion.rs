//! Language-model completion boundary.

use async_trait::async_trait;
use miette::Diagnostic;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Failure modes of a completion call.
#[derive(Debug, Error, Diagnostic)]
pub enum CompletionError {
    /// Network-level failure reaching the service.
    #[error("completion request failed: {0}")]
    #[diagnostic(
        code(corrag::clients::completion_transport),
        help("Check connectivity and the completion service base URL.")
    )]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("completion service returned status {status}: {body}")]
    #[diagnostic(code(corrag::clients::completion_status))]
    Status { status: u16, body: String },

    /// The service answered 200 but the payload had no message content.
    #[error("completion response missing message content")]
    #[diagnostic(
        code(corrag::clients::completion_shape),
        help("The choices array was empty or malformed.")
    )]
    MalformedResponse,
}

/// A language-model completion service.
///
/// One call corresponds to one model invocation with a system instruction
/// and a user prompt. Components that want structured output instruct the
/// model to emit JSON and validate the returned text themselves.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// OpenAI-compatible `chat/completions` client.
///
/// Works against any service exposing the OpenAI chat API shape (OpenAI
/// itself, local gateways, etc.). Requests are issued at temperature 0;
/// the pipeline relies on deterministic grading and classification.
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
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
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
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
            return Err(CompletionError::Status { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(CompletionError::MalformedResponse)
    }
}
