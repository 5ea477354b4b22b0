//! Environment-driven configuration.
//!
//! Settings are resolved once at startup via [`Settings::from_env`]. Missing
//! required credentials surface a [`ConfigError`] immediately, before any
//! pipeline run begins; the process should refuse to serve on that error
//! rather than fail lazily mid-run.

use miette::Diagnostic;
use thiserror::Error;

/// Fatal configuration failure raised during startup validation.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable: {name}")]
    #[diagnostic(
        code(corrag::config::missing_var),
        help("Set {name} in the environment or in a .env file.")
    )]
    MissingVar { name: &'static str },

    /// A variable was present but could not be parsed.
    #[error("invalid value for {name}: {value}")]
    #[diagnostic(
        code(corrag::config::invalid_var),
        help("Check the format of {name}; see the crate docs for expected values.")
    )]
    InvalidVar { name: &'static str, value: String },
}

/// Resolved runtime settings for the pipeline and its service clients.
#[derive(Clone, Debug)]
pub struct Settings {
    /// API key for the completion and embedding services.
    pub completion_api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub completion_base_url: String,
    /// Chat model used for classification, grading, rewriting, and answers.
    pub completion_model: String,
    /// Embedding model used for retrieval queries.
    pub embedding_model: String,
    /// API key for the vector index service.
    pub index_api_key: String,
    /// Host URL of the vector index (including scheme).
    pub index_host: String,
    /// Number of candidate passages fetched per retrieval attempt.
    pub retrieval_top_k: usize,
    /// Database URL for session persistence.
    pub session_db_url: String,
}

impl Settings {
    pub const DEFAULT_COMPLETION_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_COMPLETION_MODEL: &'static str = "gpt-3.5-turbo-0125";
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "text-embedding-3-small";
    pub const DEFAULT_RETRIEVAL_TOP_K: usize = 3;
    pub const DEFAULT_SESSION_DB_URL: &'static str = "sqlite://corrag.db";

    /// Resolve settings from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings from an arbitrary lookup function.
    ///
    /// `from_env` delegates here; tests supply a closure over a map instead
    /// of mutating the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ConfigError::MissingVar { name }),
            }
        };
        let optional =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let retrieval_top_k = match lookup("RETRIEVAL_TOP_K") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
                name: "RETRIEVAL_TOP_K",
                value: raw,
            })?,
            None => Self::DEFAULT_RETRIEVAL_TOP_K,
        };

        Ok(Self {
            completion_api_key: required("OPENAI_API_KEY")?,
            completion_base_url: optional("OPENAI_BASE_URL", Self::DEFAULT_COMPLETION_BASE_URL),
            completion_model: optional("COMPLETION_MODEL", Self::DEFAULT_COMPLETION_MODEL),
            embedding_model: optional("EMBEDDING_MODEL", Self::DEFAULT_EMBEDDING_MODEL),
            index_api_key: required("PINECONE_API_KEY")?,
            index_host: required("PINECONE_INDEX_HOST")?,
            retrieval_top_k,
            session_db_url: optional("SESSION_DB_URL", Self::DEFAULT_SESSION_DB_URL),
        })
    }
}
