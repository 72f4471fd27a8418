//! # hybridsearch-core
//!
//! Document ranking engine combining lexical relevance (BM25 over an inverted
//! index) with semantic similarity (cosine over embeddings) into one
//! deterministic ranking.
//!
//! This is the core library crate with zero async dependencies. The HTTP
//! service, PostgreSQL backend and embedding worker pool live in
//! `hybridsearch-server`.

/// BM25 full-text scoring: inverted index, Okapi BM25 scoring, and tokenizer.
pub mod bm25;
/// Global configuration constants: limits, defaults, and ranking weights.
pub mod config;
/// Core document type.
pub mod document;
/// Embedding contract and the deterministic hashing embedder.
pub mod embedding;
/// Search primitives: modes, scored results, similarity, and the hybrid merge engine.
pub mod search;
/// In-memory corpus holding documents, embeddings, and the lexical index.
pub mod storage;
