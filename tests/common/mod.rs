#![allow(dead_code)]

//! Stub clients shared across integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use corrag::clients::{
    CompletionClient, CompletionError, EmbeddingClient, EmbeddingError, IndexError, IndexMatch,
    VectorIndexClient,
};
use corrag::types::MetadataFilter;
use serde_json::json;

fn service_fault() -> CompletionError {
    CompletionError::Status {
        status: 500,
        body: "simulated service fault".to_string(),
    }
}

/// Completion stub that always returns the same reply.
pub struct StaticCompletion {
    pub reply: String,
}

impl StaticCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for StaticCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Ok(self.reply.clone())
    }
}

/// Completion stub that always fails.
pub struct FailingCompletion;

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Err(service_fault())
    }
}

/// Completion stub that echoes the caller's query back, to exercise the
/// rewrite degeneracy guard. The user prompt embeds the query after
/// "Original query: "; everything before the first newline is returned.
pub struct EchoCompletion;

#[async_trait]
impl CompletionClient for EchoCompletion {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, CompletionError> {
        let echoed = user
            .strip_prefix("Original query: ")
            .and_then(|rest| rest.lines().next())
            .unwrap_or(user);
        Ok(echoed.to_string())
    }
}

/// Completion stub that replays a scripted sequence of results, one per
/// call. Panics if called more times than scripted.
pub struct SequenceCompletion {
    replies: Mutex<VecDeque<Result<String, ()>>>,
}

impl SequenceCompletion {
    pub fn new(replies: Vec<Result<&str, ()>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl CompletionClient for SequenceCompletion {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        let next = self
            .replies
            .lock()
            .expect("sequence lock poisoned")
            .pop_front()
            .expect("SequenceCompletion exhausted");
        next.map_err(|()| service_fault())
    }
}

/// Completion stub that records every (system, user) prompt pair it sees and
/// replies with a fixed string.
pub struct RecordingCompletion {
    pub reply: String,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl RecordingCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }

    pub fn last_user_prompt(&self) -> String {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .last()
            .map(|(_, user)| user.clone())
            .expect("no completion calls recorded")
    }
}

#[async_trait]
impl CompletionClient for RecordingCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((system.to_string(), user.to_string()));
        Ok(self.reply.clone())
    }
}

/// Grader stub: replies "relevant" when the user prompt contains any of the
/// configured markers, "irrelevant" otherwise.
pub struct MarkerGrader {
    markers: Vec<String>,
}

impl MarkerGrader {
    pub fn new(markers: &[&str]) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CompletionClient for MarkerGrader {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, CompletionError> {
        let grade = if self.markers.iter().any(|m| user.contains(m)) {
            "relevant"
        } else {
            "irrelevant"
        };
        Ok(format!("{{\"grade\": \"{grade}\"}}"))
    }
}

/// Embedding stub that counts calls and records the embedded texts.
pub struct RecordingEmbedding {
    pub vector: Vec<f32>,
    pub texts: Mutex<Vec<String>>,
}

impl RecordingEmbedding {
    pub fn new() -> Self {
        Self {
            vector: vec![0.1, 0.2, 0.3],
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.texts.lock().expect("texts lock poisoned").len()
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.texts.lock().expect("texts lock poisoned").clone()
    }
}

#[async_trait]
impl EmbeddingClient for RecordingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.texts
            .lock()
            .expect("texts lock poisoned")
            .push(text.to_string());
        Ok(self.vector.clone())
    }
}

/// Embedding stub that always fails.
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingClient for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Status {
            status: 429,
            body: "simulated quota failure".to_string(),
        })
    }
}

/// Index stub returning a fixed set of matches, counting queries.
pub struct StaticIndex {
    matches: Vec<(String, String, f32)>,
    pub calls: AtomicUsize,
}

impl StaticIndex {
    pub fn new(matches: Vec<(&str, &str, f32)>) -> Self {
        Self {
            matches: matches
                .into_iter()
                .map(|(text, source, score)| (text.to_string(), source.to_string(), score))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndexClient for StaticIndex {
    async fn search(
        &self,
        _vector: &[f32],
        _namespace: &str,
        _filter: &MetadataFilter,
        _top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .matches
            .iter()
            .map(|(text, source, score)| IndexMatch {
                metadata: json!({"text": text, "source": source}),
                score: *score,
            })
            .collect())
    }
}

/// Index stub that always fails.
pub struct FailingIndex;

#[async_trait]
impl VectorIndexClient for FailingIndex {
    async fn search(
        &self,
        _vector: &[f32],
        _namespace: &str,
        _filter: &MetadataFilter,
        _top_k: usize,
    ) -> Result<Vec<IndexMatch>, IndexError> {
        Err(IndexError::Status {
            status: 503,
            body: "simulated index outage".to_string(),
        })
    }
}
