//! Grounded answer synthesis — the terminal stage of every run.

use std::sync::Arc;

use tracing::error;

use crate::clients::CompletionClient;
use crate::message::Message;
use crate::pipeline::state::Document;

/// Most recent conversation turns forwarded to the model; older history is
/// dropped, not summarized.
pub const HISTORY_WINDOW: usize = 5;

/// Context placeholder when no relevant documents survived grading.
pub const NO_CONTEXT_SENTINEL: &str = "No relevant data.";

/// Transcript placeholder for a first-turn conversation.
pub const NO_HISTORY_SENTINEL: &str = "No prior conversation.";

/// Fixed user-visible message when the final completion call itself fails.
/// Users never see raw service errors.
pub const GENERATION_FALLBACK: &str =
    "I'm having trouble putting an answer together right now. Please try again in a moment.";

const GENERATOR_SYSTEM_PROMPT: &str = "\
You are a knowledgeable and engaging assistant that answers from provided context.
- Use the provided context to accurately answer the user's query.
- Keep the tone friendly and professional, adjusting formality to the topic.
- Preserve the notation and correctness of any mathematical equations, derivations, or formulas in the context.
- Format code in proper code blocks and ensure its correctness.
- If the user greets you (e.g. 'Hi', 'Hello'), respond positively and engagingly.
- If you don't know the answer, reply with: \"Hmm, I'm not sure about that, but I'd love to help with something else!\"
- If the query is obscene, legal, financial, or ethical in nature, politely decline to answer.
- Base your response strictly on the provided context and recent conversation, citing sources when useful.";

/// Synthesizes the final answer from the query, the surviving documents, and
/// recent conversation history.
///
/// Invoked on every terminal path: grounded answers, pleasantries (with an
/// empty document set), and post-exhaustion apologies. The empty-context and
/// empty-history cases are rendered as sentinel markers the prompt is
/// designed to handle.
pub struct ResponseGenerator {
    completion: Arc<dyn CompletionClient>,
}

impl ResponseGenerator {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Generate the final answer. Never fails: a completion fault collapses
    /// to [`GENERATION_FALLBACK`].
    pub async fn generate(
        &self,
        query: &str,
        relevant_docs: &[Document],
        history: &[Message],
    ) -> String {
        let context = render_context(relevant_docs);
        let transcript = render_history(history);
        let user = format!(
            "Query: {query}\n\nContext: {context}\n\nRecent conversation:\n{transcript}\n\nAnswer:"
        );

        match self.completion.complete(GENERATOR_SYSTEM_PROMPT, &user).await {
            Ok(answer) => {
                let answer = answer.trim();
                if answer.is_empty() {
                    error!("generator returned empty text, using fallback message");
                    GENERATION_FALLBACK.to_string()
                } else {
                    answer.to_string()
                }
            }
            Err(error) => {
                error!(%error, "final response generation failed, using fallback message");
                GENERATION_FALLBACK.to_string()
            }
        }
    }
}

fn render_context(relevant_docs: &[Document]) -> String {
    if relevant_docs.is_empty() {
        return NO_CONTEXT_SENTINEL.to_string();
    }
    relevant_docs
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the most recent [`HISTORY_WINDOW`] turns as a transcript,
/// preserving original order.
pub fn render_history(history: &[Message]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let recent = &history[start..];
    if recent.is_empty() {
        return NO_HISTORY_SENTINEL.to_string();
    }
    recent
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
