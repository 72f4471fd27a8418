//! Search primitives: modes, scored results, cosine similarity, and the
//! hybrid merge engine.

/// Hybrid merge engine: ordering, tie-breaking, missing-signal policy, truncation.
pub mod hybrid;
/// Cosine similarity for the semantic scorer.
pub mod similarity;
/// Search modes and scored result types.
pub mod types;

pub use hybrid::{rank_hybrid, rank_lexical, rank_semantic, HybridCandidate};
pub use types::{combined_score, RankedResults, ScoredResult, SearchMode};
