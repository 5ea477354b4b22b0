//! Per-document relevance grading.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::clients::CompletionClient;
use crate::pipeline::extract_json_object;
use crate::pipeline::state::Document;

const GRADER_SYSTEM_PROMPT: &str = "\
You are a grader assessing whether a retrieved document is relevant to a user query. \
Judge semantic and methodological relevance, not just keyword overlap. \
If the document helps answer the query, grade it as 'relevant'; otherwise 'irrelevant'. \
Respond strictly in JSON with the single key 'grade'.";

/// Tagged verdict validated at the completion boundary. Any other shape the
/// model produces is normalized into the conservative default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum GradeVerdict {
    Relevant,
    Irrelevant,
}

#[derive(Deserialize)]
struct GraderReply {
    grade: GradeVerdict,
}

/// Result of one grading pass over a retrieved document set.
///
/// Both subsequences preserve the input (retrieval) order.
#[derive(Clone, Debug, Default)]
pub struct GradeOutcome {
    pub relevant: Vec<Document>,
    pub irrelevant: Vec<Document>,
}

/// Filters retrieved passages by asking the model, per document, whether it
/// is relevant to the current query.
///
/// Grading is sequential in input order and has no retry; each document is
/// graded at most once per pass. A failed or malformed grading call marks
/// that one document irrelevant and never blocks the rest of the batch.
pub struct DocumentGrader {
    completion: Arc<dyn CompletionClient>,
}

impl DocumentGrader {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self { completion }
    }

    /// Grade `documents` against `query`. Empty input short-circuits to an
    /// empty outcome without calling the model.
    pub async fn grade(&self, query: &str, documents: &[Document]) -> GradeOutcome {
        let mut outcome = GradeOutcome::default();
        if documents.is_empty() {
            return outcome;
        }

        for document in documents {
            match self.grade_one(query, document).await {
                GradeVerdict::Relevant => {
                    debug!(source = %document.source, "document graded relevant");
                    outcome.relevant.push(document.clone());
                }
                GradeVerdict::Irrelevant => {
                    debug!(source = %document.source, "document graded irrelevant");
                    outcome.irrelevant.push(document.clone());
                }
            }
        }
        outcome
    }

    async fn grade_one(&self, query: &str, document: &Document) -> GradeVerdict {
        let user = format!("Query: {query}\n\nDocument: {}", document.content);
        match self.completion.complete(GRADER_SYSTEM_PROMPT, &user).await {
            Ok(raw) => match parse_reply(&raw) {
                Some(verdict) => verdict,
                None => {
                    warn!(reply = %raw, "unrecognized grader output, treating as irrelevant");
                    GradeVerdict::Irrelevant
                }
            },
            Err(error) => {
                warn!(%error, "grading call failed, treating document as irrelevant");
                GradeVerdict::Irrelevant
            }
        }
    }
}

fn parse_reply(raw: &str) -> Option<GradeVerdict> {
    let object = extract_json_object(raw)?;
    serde_json::from_str::<GraderReply>(object)
        .ok()
        .map(|reply| reply.grade)
}
