//! hybridsearch-server: HTTP service for hybrid document search.
//!
//! Provides the REST API, the embedding worker pool, storage backends
//! (PostgreSQL/pgvector and in-memory), and the search orchestrator.
//! Ranking logic lives in `hybridsearch-core`.

/// REST API layer: Axum router, HTTP handlers, models, metrics.
pub mod api;
/// Embedding provider: lazy model initialization and a bounded worker pool.
pub mod embedding;
/// Search orchestrator: validation, dispatch, and error taxonomy.
pub mod search;
/// Sample documents and corpus-file ingestion.
pub mod seed;
/// Storage backends behind the `SearchStore` trait.
pub mod store;
