//! BM25 full-text scoring.
//!
//! Implements Okapi BM25 scoring with an inverted index for the in-memory
//! lexical scorer. Documents are tokenized with a lowercasing tokenizer and
//! English stop word removal. No stemming is applied.

/// Inverted index data structure with postings lists.
pub mod inverted_index;
/// BM25 Okapi scoring with a conjunctive match predicate.
pub mod scorer;
/// Lowercasing tokenizer with stop word filtering.
pub mod tokenizer;

pub use inverted_index::InvertedIndex;
pub use scorer::bm25_match;
