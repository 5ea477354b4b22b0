//! The self-correcting retrieval pipeline.
//!
//! One run flows through an explicit finite-state machine:
//!
//! ```text
//! Classify ──pleasantry──────────────────────────► Respond
//!    │ question
//!    ▼
//! Retrieve ──► Grade ──relevant docs──────────────► Respond
//!                │ none, attempts left
//!                ▼
//!             Rewrite ──► Retrieve (fresh attempt)
//!                │ none, attempts exhausted
//!                ▼
//!             Respond (empty-context apology)
//! ```
//!
//! Each stage wraps exactly one kind of external call and converts transient
//! failures into a safe default, so the orchestrator's transition function is
//! total. See [`orchestrator::ChatPipeline`] for the transition rules and the
//! retry ceiling.

pub mod classifier;
pub mod generator;
pub mod grader;
pub mod orchestrator;
pub mod retriever;
pub mod rewriter;
pub mod state;

pub use classifier::InputClassifier;
pub use generator::ResponseGenerator;
pub use grader::{DocumentGrader, GradeOutcome};
pub use orchestrator::{ChatPipeline, MAX_REWRITE_ATTEMPTS, RunOutcome, RunRequest, Stage};
pub use retriever::Retriever;
pub use rewriter::QueryRewriter;
pub use state::{Document, InputType, PipelineState};

/// Slice out the first JSON object embedded in model output.
///
/// Models occasionally wrap structured replies in prose or code fences; the
/// verdict parsers tolerate that by extracting the outermost `{...}` span
/// before deserializing.
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::extract_json_object;

    #[test]
    fn extracts_fenced_json() {
        let raw = "```json\n{\"grade\": \"relevant\"}\n```";
        assert_eq!(extract_json_object(raw), Some("{\"grade\": \"relevant\"}"));
    }

    #[test]
    fn rejects_text_without_object() {
        assert_eq!(extract_json_object("relevant"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }
}
