//! Storage layer for the in-memory backend.
//!
//! Documents, their embeddings, and the BM25 index live together in a
//! [`Corpus`]; scoring reads all of them under one read lock.

/// In-memory corpus and its lexical, semantic, and hybrid scorers.
pub mod corpus;

pub use corpus::{Corpus, CorpusData, CorpusError};
