//! The state value threaded through one pipeline run.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::types::MetadataFilter;

/// Classification of a user utterance, set once by the input classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Seeks information, clarification, or problem-solving; takes the
    /// retrieval path.
    Question,
    /// Greeting or social nicety; skips retrieval entirely.
    Pleasantry,
    /// Not yet classified.
    #[default]
    Unknown,
}

/// A retrieved passage, created by the retriever from a raw index match.
///
/// Consumed read-only by the grader and the response generator; documents
/// have no lifecycle beyond a single pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Passage text.
    pub content: String,
    /// Source label carried in index metadata.
    pub source: String,
    /// Similarity score reported by the index, when available.
    pub relevance_score: Option<f32>,
}

impl Document {
    /// Sentinel used when index metadata carries no passage text.
    pub const NO_CONTENT: &'static str = "No content available";
    /// Sentinel used when index metadata carries no source label.
    pub const UNKNOWN_SOURCE: &'static str = "Unknown";

    #[must_use]
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            relevance_score: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.relevance_score = Some(score);
        self
    }
}

/// Mutable record owned by the orchestrator for the duration of one run.
///
/// Invariants maintained by the orchestrator:
/// - `relevant_docs` is always an order-preserving subset of the most recent
///   `retrieved_docs`; grading never invents documents.
/// - `attempt_count` grows by at most 1 per rewrite step and never exceeds
///   the orchestrator's retry ceiling.
/// - `input_type` is set once by the classifier and immutable afterward.
/// - `namespace` and `metadata_filter` are constant for the run.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    /// Current (possibly rewritten) query text. Mutated only by the rewrite
    /// step.
    pub query: String,
    /// Append-only audit log of every rewrite produced.
    pub rewritten_queries: Vec<String>,
    /// Candidates from the most recent retrieval, replaced wholesale each
    /// pass.
    pub retrieved_docs: Vec<Document>,
    /// Graded survivors of the most recent grading pass.
    pub relevant_docs: Vec<Document>,
    /// Rewrite attempts consumed so far.
    pub attempt_count: u32,
    /// Classification of the original utterance.
    pub input_type: InputType,
    /// Index partition to retrieve from.
    pub namespace: String,
    /// Server-side metadata predicate, passed through to the index unmodified.
    pub metadata_filter: MetadataFilter,
    /// Final answer text; empty until the terminal step.
    pub response: String,
    /// Conversation history supplied by the caller, carried across runs.
    pub messages: Vec<Message>,
}

impl PipelineState {
    #[must_use]
    pub fn new(
        query: String,
        namespace: String,
        metadata_filter: MetadataFilter,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            query,
            namespace,
            metadata_filter,
            messages,
            ..Default::default()
        }
    }
}
