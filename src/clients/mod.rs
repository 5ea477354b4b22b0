//! Clients for the three external collaborators of the pipeline.
//!
//! Each boundary is a small async trait so the orchestration core never
//! depends on a concrete provider:
//!
//! - [`CompletionClient`] — language-model text completion
//! - [`EmbeddingClient`] — text-to-vector embedding
//! - [`VectorIndexClient`] — similarity search scoped by namespace and filter
//!
//! The shipped implementations speak the OpenAI-compatible HTTP API
//! ([`OpenAiCompletionClient`], [`OpenAiEmbeddingClient`]) and a
//! Pinecone-style index API ([`PineconeIndexClient`]). Transient faults are
//! *not* retried here; the pipeline components convert them into safe
//! defaults at their own boundary.

pub mod completion;
pub mod embedding;
pub mod index;

pub use completion::{CompletionClient, CompletionError, OpenAiCompletionClient};
pub use embedding::{EmbeddingClient, EmbeddingError, OpenAiEmbeddingClient};
pub use index::{IndexError, IndexMatch, PineconeIndexClient, VectorIndexClient};
