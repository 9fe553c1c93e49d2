//! Memory search collaborator trait
//!
//! The extraction pipeline enriches tasks with snippets from a memory store.
//! The store itself is an external collaborator: the engine only needs this
//! read-only search capability, injected at construction. Implementations are
//! free to back it with anything from a flat file to a vector database.

use crate::errors::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ranked result from a memory search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    /// The remembered text
    pub content: String,

    /// Where the memory came from (file name, note title, ...)
    pub source: String,

    /// When the memory was recorded
    pub timestamp: DateTime<Utc>,

    /// Relevance score in [0, 1], higher is more relevant
    pub score: f64,
}

/// Read-only search capability over a memory store
#[async_trait]
pub trait MemorySearch: Send + Sync {
    /// Return up to `limit` hits for `query` with score >= `min_score`,
    /// ordered by descending relevance.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        min_score: f64,
    ) -> Result<Vec<MemoryHit>, EngineError>;
}
