//! Conversation session persistence.
//!
//! Sessions carry the chat history and retrieval scope across pipeline runs.
//! The store contract is last-write-wins; no transactional guarantee is
//! required beyond that. An in-memory store backs tests and embedded use;
//! the SQLite store (behind the default-on `sqlite` feature) provides
//! durable persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::message::Message;

/// Errors raised by session stores.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionStoreError {
    /// Backend I/O failure (connection, query).
    #[error("session backend error: {message}")]
    #[diagnostic(
        code(corrag::session::backend),
        help("Ensure the session database URL is valid and accessible.")
    )]
    Backend { message: String },

    /// A persisted record could not be (de)serialized.
    #[error("session serialization error: {0}")]
    #[diagnostic(code(corrag::session::serde))]
    Serde(#[from] serde_json::Error),
}

/// One conversation session: history plus retrieval scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Stable session identifier.
    pub id: String,
    /// Index partition this session retrieves from.
    pub namespace: String,
    /// Conversation turns, oldest first.
    pub messages: Vec<Message>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create a fresh session with a random id.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), namespace)
    }

    /// Create a session with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Refresh the update timestamp; call before saving.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Session persistence contract: `load` returns `None` for absent ids,
/// `save` upserts, `delete` is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, SessionStoreError>;
    async fn save(&self, session: &ChatSession) -> Result<(), SessionStoreError>;
    async fn delete(&self, session_id: &str) -> Result<(), SessionStoreError>;
}

/// Non-durable store for tests and embedded single-process use.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<FxHashMap<String, ChatSession>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, SessionStoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session: &ChatSession) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteSessionStore;

#[cfg(feature = "sqlite")]
mod sqlite_store {
    use sqlx::{Row, SqlitePool};
    use tracing::instrument;

    use super::{ChatSession, DateTime, SessionStore, SessionStoreError, Utc, async_trait};

    /// SQLite-backed session store.
    ///
    /// The schema is created idempotently on connect; no external migration
    /// orchestration is assumed.
    pub struct SqliteSessionStore {
        pool: SqlitePool,
    }

    impl SqliteSessionStore {
        /// Connect (or create) a SQLite database at `database_url`.
        /// Example URL: `sqlite://corrag.db`.
        #[instrument(skip(database_url))]
        pub async fn connect(database_url: &str) -> Result<Self, SessionStoreError> {
            let pool = SqlitePool::connect(database_url)
                .await
                .map_err(|e| SessionStoreError::Backend {
                    message: format!("connect error: {e}"),
                })?;
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS sessions (
                    id TEXT PRIMARY KEY,
                    namespace TEXT NOT NULL,
                    messages_json TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await
            .map_err(|e| SessionStoreError::Backend {
                message: format!("schema error: {e}"),
            })?;
            Ok(Self { pool })
        }
    }

    #[async_trait]
    impl SessionStore for SqliteSessionStore {
        async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, SessionStoreError> {
            let row = sqlx::query(
                "SELECT id, namespace, messages_json, updated_at FROM sessions WHERE id = ?",
            )
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SessionStoreError::Backend {
                message: e.to_string(),
            })?;

            let Some(row) = row else {
                return Ok(None);
            };

            let messages_json: String = row.get("messages_json");
            let updated_at_raw: String = row.get("updated_at");
            let updated_at = DateTime::parse_from_rfc3339(&updated_at_raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| SessionStoreError::Backend {
                    message: format!("bad updated_at '{updated_at_raw}': {e}"),
                })?;

            Ok(Some(ChatSession {
                id: row.get("id"),
                namespace: row.get("namespace"),
                messages: serde_json::from_str(&messages_json)?,
                updated_at,
            }))
        }

        async fn save(&self, session: &ChatSession) -> Result<(), SessionStoreError> {
            let messages_json = serde_json::to_string(&session.messages)?;
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO sessions (id, namespace, messages_json, updated_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&session.id)
            .bind(&session.namespace)
            .bind(&messages_json)
            .bind(session.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| SessionStoreError::Backend {
                message: e.to_string(),
            })?;
            Ok(())
        }

        async fn delete(&self, session_id: &str) -> Result<(), SessionStoreError> {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(|e| SessionStoreError::Backend {
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }
}
