//! Global configuration constants for hybridsearch.
//!
//! All ranking weights, input validation limits, and server defaults are defined here.
//! These are compile-time constants; runtime configuration is handled via CLI arguments
//! and environment variables in the server's `main.rs`.

/// Weight applied to the lexical score in hybrid mode.
///
/// `combined = HYBRID_LEXICAL_WEIGHT * lexical + HYBRID_SEMANTIC_WEIGHT * semantic`.
pub const HYBRID_LEXICAL_WEIGHT: f64 = 0.5;

/// Weight applied to the semantic score in hybrid mode.
pub const HYBRID_SEMANTIC_WEIGHT: f64 = 0.5;

/// Lexical score assigned in hybrid mode to documents the text predicate does not match.
///
/// Means "no lexical evidence", not "worst possible".
pub const NO_LEXICAL_MATCH_SCORE: f64 = 0.0;

/// BM25 Okapi term frequency saturation parameter.
///
/// Controls how quickly term frequency saturates. Higher values allow TF to grow more.
/// Standard value is 1.2 (range: 1.0–2.0).
pub const BM25_K1: f32 = 1.2;

/// BM25 Okapi document length normalization parameter.
///
/// 0.0 = no normalization, 1.0 = full normalization. Standard value is 0.75.
pub const BM25_B: f32 = 0.75;

/// Number of results returned when the request does not specify a limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Maximum number of results per search request.
pub const MAX_LIMIT: usize = 100;

/// Maximum length of the query text in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// Embedding dimension of the default encoder (all-MiniLM-L6-v2 produces 384).
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Maximum allowed embedding dimension.
pub const MAX_EMBEDDING_DIMENSION: usize = 4096;

/// Default size of the embedding worker pool.
pub const DEFAULT_EMBED_WORKERS: usize = 2;

/// Default timeout in seconds for a single embedding computation.
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 10;

/// Seconds allowed for the one-time embedding model load (includes a first-run download).
pub const DEFAULT_MODEL_LOAD_TIMEOUT_SECS: u64 = 120;

/// HuggingFace model id loaded by the MiniLM embedder.
pub const DEFAULT_MINILM_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Token limit of the MiniLM encoder; longer inputs are truncated.
pub const MINILM_MAX_SEQUENCE_LENGTH: usize = 256;

/// Minimum number of pooled storage connections.
pub const DEFAULT_POOL_MIN_CONNECTIONS: u32 = 1;

/// Default maximum number of pooled storage connections.
pub const DEFAULT_POOL_MAX_CONNECTIONS: u32 = 5;

/// Upper bound accepted for `--pool-max-connections`.
pub const MAX_POOL_CONNECTIONS: u32 = 10;

/// Seconds a request waits for a pooled connection before failing.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Per-query storage timeout in seconds.
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL text search configuration used for `to_tsvector` / `plainto_tsquery`.
pub const DEFAULT_TEXT_SEARCH_CONFIG: &str = "english";

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum HTTP request body size in bytes (64 KB).
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Maximum number of concurrent in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Seconds allowed for closing the storage pool after the server stops accepting requests.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;
