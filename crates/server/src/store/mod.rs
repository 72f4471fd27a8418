//! Storage backends.
//!
//! A [`SearchStore`] executes the three scorer queries against a corpus and
//! hands raw scores to the merge engine in `hybridsearch_core::search`, so every
//! backend returns the same ordering, tie-breaking, and missing-signal policy.
//!
//! - [`postgres::PgStore`]: PostgreSQL full-text search + pgvector, bounded `sqlx` pool
//! - [`memory::MemoryStore`]: in-process [`hybridsearch_core::storage::Corpus`]

/// In-memory backend.
pub mod memory;
/// PostgreSQL + pgvector backend.
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgStore, PgStoreConfig};

use async_trait::async_trait;
use hybridsearch_core::search::RankedResults;
use hybridsearch_core::storage::CorpusError;
use serde::Deserialize;
use std::time::Duration;

/// Failure of a storage query or of the connection layer beneath it.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage query timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// A document to ingest. Without an `id` the backend assigns the next serial id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
}

/// Query executor for the lexical, semantic, and combined rankings.
///
/// Implementations are shared across concurrent requests and must be
/// internally synchronized.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Short backend name for logs and readiness output.
    fn backend(&self) -> &'static str;

    /// Documents matching the text predicate, by lexical score.
    async fn keyword_search(&self, query: &str, limit: usize)
        -> Result<RankedResults, StorageError>;

    /// Every document with an embedding, by `1 - cosine distance`.
    async fn semantic_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError>;

    /// Both scores for every candidate, combined before truncation.
    async fn hybrid_search(
        &self,
        query: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError>;

    /// Trivial round-trip used by the readiness check.
    async fn ping(&self) -> Result<(), StorageError>;

    async fn document_count(&self) -> Result<u64, StorageError>;

    /// Stores a document with the embedding of its body. Returns the id.
    async fn insert_document(
        &self,
        doc: NewDocument,
        embedding: Vec<f32>,
    ) -> Result<i64, StorageError>;

    /// Releases pooled resources. Called once at shutdown.
    async fn close(&self);
}
