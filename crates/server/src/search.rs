//! Search orchestration: request validation, mode dispatch, and the error
//! taxonomy surfaced to the HTTP layer.

use crate::api::metrics;
use crate::embedding::EmbeddingProvider;
use crate::store::{SearchStore, StorageError};
use hybridsearch_core::config;
use hybridsearch_core::embedding::EncodingError;
use hybridsearch_core::search::{RankedResults, SearchMode};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a search produced no results.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Malformed request; never retried.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    text: String,
    mode: SearchMode,
    limit: usize,
}

impl SearchQuery {
    /// Validates raw request fields.
    ///
    /// An unrecognized `mode` falls back to hybrid; a missing `limit` uses
    /// [`config::DEFAULT_LIMIT`].
    pub fn new(text: &str, mode: Option<&str>, limit: Option<usize>) -> Result<Self, SearchError> {
        if text.trim().is_empty() {
            return Err(SearchError::Validation("Query cannot be empty.".into()));
        }
        if text.len() > config::MAX_QUERY_LEN {
            return Err(SearchError::Validation(format!(
                "Query exceeds maximum length of {} bytes",
                config::MAX_QUERY_LEN
            )));
        }
        let limit = limit.unwrap_or(config::DEFAULT_LIMIT);
        if limit == 0 || limit > config::MAX_LIMIT {
            return Err(SearchError::Validation(format!(
                "limit must be 1-{}",
                config::MAX_LIMIT
            )));
        }
        Ok(Self {
            text: text.to_owned(),
            mode: mode.map(SearchMode::parse).unwrap_or_default(),
            limit,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Runs validated queries against a store, embedding the query text only
/// when the mode needs it.
#[derive(Clone)]
pub struct SearchOrchestrator {
    store: Arc<dyn SearchStore>,
    embeddings: EmbeddingProvider,
    storage_timeout: Duration,
}

impl SearchOrchestrator {
    pub fn new(
        store: Arc<dyn SearchStore>,
        embeddings: EmbeddingProvider,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            store,
            embeddings,
            storage_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn SearchStore> {
        &self.store
    }

    pub fn embeddings(&self) -> &EmbeddingProvider {
        &self.embeddings
    }

    /// Executes `query`. Failures are logged with their cause and never
    /// yield partial results.
    pub async fn search(&self, query: &SearchQuery) -> Result<RankedResults, SearchError> {
        let start = Instant::now();
        let outcome = self.dispatch(query).await;
        let mode = query.mode.as_str();
        match &outcome {
            Ok(ranked) => {
                metrics::record_search(mode, "ok");
                tracing::info!(
                    mode,
                    limit = query.limit,
                    results = ranked.count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Search completed"
                );
            }
            Err(e) => {
                metrics::record_search(mode, "error");
                tracing::error!(mode, backend = self.store.backend(), error = %e, "Search failed");
            }
        }
        outcome
    }

    async fn dispatch(&self, query: &SearchQuery) -> Result<RankedResults, SearchError> {
        let ranked = match query.mode {
            SearchMode::Keyword => {
                self.bounded(self.store.keyword_search(&query.text, query.limit))
                    .await?
            }
            SearchMode::Semantic => {
                let embedding = self.embeddings.embed(&query.text).await?;
                self.bounded(self.store.semantic_search(&embedding, query.limit))
                    .await?
            }
            SearchMode::Hybrid => {
                let embedding = self.embeddings.embed(&query.text).await?;
                self.bounded(
                    self.store
                        .hybrid_search(&query.text, &embedding, query.limit),
                )
                .await?
            }
        };
        Ok(ranked)
    }

    async fn bounded<F>(&self, query: F) -> Result<RankedResults, StorageError>
    where
        F: Future<Output = Result<RankedResults, StorageError>>,
    {
        tokio::time::timeout(self.storage_timeout, query)
            .await
            .map_err(|_| StorageError::Timeout(self.storage_timeout))?
    }
}
