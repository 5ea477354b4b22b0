//! Query rewriting for retrieval retries.

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::CompletionClient;

const REWRITER_SYSTEM_PROMPT: &str = "\
You are a query rewriter that improves retrieval. \
If a query is already optimized, modify it slightly to increase retrieval success. \
Reply with the rewritten query only.";

/// Fixed suffix appended when the model echoes the query back unchanged.
pub const CLARIFYING_SUFFIX: &str = " in simple terms";

/// Reformulates a query to improve retrieval.
///
/// Degeneracy guard: if the model returns the same string (compared
/// case-insensitively), a fixed clarifying suffix is appended so a
/// successful rewrite always differs textually from its input. On a
/// completion failure the original query is returned unchanged, which the
/// caller detects by equality.
pub struct QueryRewriter {
    completion: Arc<dyn CompletionClient>,
}

impl QueryRewriter {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    pub async fn rewrite(&self, query: &str) -> String {
        let user = format!("Original query: {query}\n\nImprove this query for better retrieval.");
        match self.completion.complete(REWRITER_SYSTEM_PROMPT, &user).await {
            Ok(raw) => {
                let improved = raw.trim();
                if improved.is_empty() || improved.eq_ignore_ascii_case(query.trim()) {
                    warn!("rewriter returned an identical query, appending clarifying suffix");
                    format!("{query}{CLARIFYING_SUFFIX}")
                } else {
                    info!(rewritten = %improved, "query rewritten");
                    improved.to_string()
                }
            }
            Err(error) => {
                warn!(%error, "query rewriting failed, keeping original query");
                query.to_string()
            }
        }
    }
}
