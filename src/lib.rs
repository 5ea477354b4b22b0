//! # Corrag: Self-correcting Retrieval-Augmented Chat Pipeline
//!
//! Corrag answers user questions from a vector index with a corrective
//! control loop: it classifies the utterance, retrieves supporting passages,
//! grades their relevance with a language model, rewrites the query and
//! retries when nothing survives, and finally synthesizes a grounded answer
//! (or a graceful apology) — all under a hard two-attempt rewrite ceiling.
//!
//! ## Core Concepts
//!
//! - **Pipeline stages**: classify → retrieve → grade → rewrite → respond,
//!   wired as an explicit finite-state machine ([`pipeline::ChatPipeline`])
//! - **Clients**: small async traits over the external completion,
//!   embedding, and vector-index services ([`clients`])
//! - **Messages**: role-tagged conversation turns carried across runs
//!   ([`message::Message`])
//! - **Sessions**: optional persistence of history and retrieval scope
//!   ([`session`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use corrag::clients::{OpenAiCompletionClient, OpenAiEmbeddingClient, PineconeIndexClient};
//! use corrag::config::Settings;
//! use corrag::pipeline::{ChatPipeline, RunRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! corrag::telemetry::init();
//! let settings = Settings::from_env()?;
//!
//! let completion = Arc::new(OpenAiCompletionClient::new(
//!     &settings.completion_base_url,
//!     &settings.completion_api_key,
//!     &settings.completion_model,
//! ));
//! let embedding = Arc::new(OpenAiEmbeddingClient::new(
//!     &settings.completion_base_url,
//!     &settings.completion_api_key,
//!     &settings.embedding_model,
//! ));
//! let index = Arc::new(PineconeIndexClient::new(
//!     &settings.index_host,
//!     &settings.index_api_key,
//! ));
//!
//! let pipeline = ChatPipeline::new(completion, embedding, index);
//! let outcome = pipeline
//!     .run(RunRequest::new("What is coupling?", "SE_Software_Engineering"))
//!     .await;
//! println!("{}", outcome.answer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure Philosophy
//!
//! Transient faults in external services never abort a run: each stage
//! absorbs its own failures into a safe default (default classification,
//! empty candidates, conservative irrelevance, unchanged query, fixed
//! fallback answer). The only fatal error surface is configuration
//! validation at startup ([`config::Settings::from_env`]).
//!
//! ## Module Guide
//!
//! - [`pipeline`] - The state machine and its five stages
//! - [`clients`] - External-service traits and HTTP implementations
//! - [`message`] - Conversation turn type
//! - [`session`] - Session records and persistence stores
//! - [`config`] - Environment-driven settings
//! - [`telemetry`] - Tracing subscriber bootstrap

pub mod clients;
pub mod config;
pub mod message;
pub mod pipeline;
pub mod session;
pub mod telemetry;
pub mod types;

pub use message::Message;
pub use pipeline::{ChatPipeline, RunOutcome, RunRequest};
