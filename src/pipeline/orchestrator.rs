//! The orchestration state machine.
//!
//! Sequences classification, retrieval, grading, rewriting, and answer
//! synthesis under a bounded-retry policy. The transition logic is a pure
//! function over [`PipelineState`] (see [`ChatPipeline::next_stage`]), so
//! every run reaches [`Stage::Respond`] in a finite number of transitions
//! regardless of what the external services return.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::clients::{CompletionClient, EmbeddingClient, VectorIndexClient};
use crate::message::Message;
use crate::pipeline::classifier::InputClassifier;
use crate::pipeline::generator::ResponseGenerator;
use crate::pipeline::grader::DocumentGrader;
use crate::pipeline::retriever::Retriever;
use crate::pipeline::rewriter::QueryRewriter;
use crate::pipeline::state::{InputType, PipelineState};
use crate::types::MetadataFilter;

/// Hard ceiling on rewrite attempts per run, enforced by the orchestrator
/// independently of what the rewriter returns. Prevents retry storms against
/// the completion service even if the rewriter never converges.
pub const MAX_REWRITE_ATTEMPTS: u32 = 2;

/// The states of one pipeline run. `Respond` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Retrieve,
    Grade,
    Rewrite,
    Respond,
}

/// Inputs for one pipeline run. All session context is threaded explicitly;
/// the pipeline holds no ambient state across runs.
#[derive(Clone, Debug, Default)]
pub struct RunRequest {
    /// The user's utterance.
    pub query: String,
    /// Index partition to retrieve from.
    pub namespace: String,
    /// Server-side metadata predicate, passed to the index unmodified.
    pub metadata_filter: MetadataFilter,
    /// Conversation history so far, oldest first.
    pub messages: Vec<Message>,
}

impl RunRequest {
    #[must_use]
    pub fn new(query: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_metadata_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = filter;
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }
}

/// Result of one completed run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// The final answer text (grounded answer, pleasant reply, or apology).
    pub answer: String,
    /// Input history plus one user turn and one assistant turn, in order.
    pub messages: Vec<Message>,
    /// The final pipeline state, exposed for observability and tests.
    pub state: PipelineState,
}

/// The adaptive retrieval pipeline:
/// classify → retrieve → grade → (rewrite → retrieve → grade)* → respond.
///
/// Transition rules, evaluated after each grading pass:
/// 1. Pleasantries skip retrieval entirely and go straight to respond.
/// 2. Questions retrieve then grade.
/// 3. Any surviving relevant documents → respond.
/// 4. Otherwise, while attempts remain, rewrite (consuming one attempt,
///    replacing the query when the rewrite genuinely differs) and re-enter a
///    fresh retrieval.
/// 5. With attempts exhausted and still nothing relevant → respond with an
///    empty document set; the generator's own insufficient-information
///    phrasing is the effective apology.
///
/// All external calls within a run are strictly sequential.
pub struct ChatPipeline {
    classifier: InputClassifier,
    retriever: Retriever,
    grader: DocumentGrader,
    rewriter: QueryRewriter,
    generator: ResponseGenerator,
}

impl ChatPipeline {
    /// Wire a pipeline from the three external-service clients, sharing the
    /// completion client across all model-backed stages.
    #[must_use]
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        embedding: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndexClient>,
    ) -> Self {
        Self {
            classifier: InputClassifier::new(completion.clone()),
            retriever: Retriever::new(embedding, index),
            grader: DocumentGrader::new(completion.clone()),
            rewriter: QueryRewriter::new(completion.clone()),
            generator: ResponseGenerator::new(completion),
        }
    }

    /// Assemble a pipeline from independently constructed stages. Useful
    /// when stages need distinct clients or tuned retrievers.
    #[must_use]
    pub fn from_parts(
        classifier: InputClassifier,
        retriever: Retriever,
        grader: DocumentGrader,
        rewriter: QueryRewriter,
        generator: ResponseGenerator,
    ) -> Self {
        Self {
            classifier,
            retriever,
            grader,
            rewriter,
            generator,
        }
    }

    /// The transition table. Pure: reads state, performs no calls.
    fn next_stage(state: &PipelineState, current: Stage) -> Stage {
        match current {
            Stage::Classify => match state.input_type {
                InputType::Pleasantry => Stage::Respond,
                InputType::Question | InputType::Unknown => Stage::Retrieve,
            },
            Stage::Retrieve => Stage::Grade,
            Stage::Grade => {
                if !state.relevant_docs.is_empty() {
                    Stage::Respond
                } else if state.attempt_count < MAX_REWRITE_ATTEMPTS {
                    Stage::Rewrite
                } else {
                    Stage::Respond
                }
            }
            Stage::Rewrite => Stage::Retrieve,
            Stage::Respond => Stage::Respond,
        }
    }

    /// Run the pipeline for one user turn.
    ///
    /// The sole public entry point of the core. Always terminates: the only
    /// loop is the rewrite retry, bounded by [`MAX_REWRITE_ATTEMPTS`].
    #[instrument(skip(self, request), fields(namespace = %request.namespace))]
    pub async fn run(&self, request: RunRequest) -> RunOutcome {
        let RunRequest {
            query,
            namespace,
            metadata_filter,
            messages,
        } = request;
        // The user turn appended to history carries the original utterance,
        // not any rewrite.
        let user_turn = Message::user(&query);
        let mut state = PipelineState::new(query, namespace, metadata_filter, messages);
        let mut stage = Stage::Classify;

        loop {
            match stage {
                Stage::Classify => {
                    state.input_type = self.classifier.classify(&state.query).await;
                    info!(input_type = ?state.input_type, "classified user input");
                }
                Stage::Retrieve => {
                    state.retrieved_docs = self
                        .retriever
                        .retrieve(&state.query, &state.namespace, &state.metadata_filter)
                        .await;
                    state.relevant_docs.clear();
                    info!(
                        count = state.retrieved_docs.len(),
                        attempt = state.attempt_count,
                        "retrieved candidate documents"
                    );
                }
                Stage::Grade => {
                    let outcome = self.grader.grade(&state.query, &state.retrieved_docs).await;
                    info!(
                        relevant = outcome.relevant.len(),
                        irrelevant = outcome.irrelevant.len(),
                        "graded candidate documents"
                    );
                    state.relevant_docs = outcome.relevant;
                }
                Stage::Rewrite => {
                    state.attempt_count += 1;
                    let rewritten = self.rewriter.rewrite(&state.query).await;
                    if rewritten == state.query {
                        warn!(
                            attempt = state.attempt_count,
                            "rewrite produced no change, retrying with the same query"
                        );
                    } else {
                        state.rewritten_queries.push(rewritten.clone());
                        state.query = rewritten;
                    }
                }
                Stage::Respond => {
                    if state.relevant_docs.is_empty() && state.input_type == InputType::Question {
                        warn!(
                            attempts = state.attempt_count,
                            "no relevant documents survived, responding without grounding"
                        );
                    }
                    state.response = self
                        .generator
                        .generate(&state.query, &state.relevant_docs, &state.messages)
                        .await;
                    break;
                }
            }
            stage = Self::next_stage(&state, stage);
        }

        let mut messages = state.messages.clone();
        messages.push(user_turn);
        messages.push(Message::assistant(&state.response));
        RunOutcome {
            answer: state.response.clone(),
            messages,
            state,
        }
    }
}
