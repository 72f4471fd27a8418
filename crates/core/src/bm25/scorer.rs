//! BM25 Okapi scoring engine.
//!
//! Scores documents against a query using the BM25 formula with configurable
//! `k1` and `b` parameters (see [`crate::config`]). Matching is conjunctive:
//! a document is a hit only when it contains every distinct query term, the
//! same predicate as PostgreSQL's `plainto_tsquery`.

use crate::bm25::inverted_index::InvertedIndex;
use crate::bm25::tokenizer::tokenize;
use crate::config;
use std::collections::HashMap;

/// Scores every document matching all query terms.
///
/// Returns `internal_id → score`. Documents missing any term are absent, not
/// scored zero. A query with no indexable terms (empty, or only stop words)
/// matches nothing. Scores are strictly positive.
pub fn bm25_match(index: &InvertedIndex, query: &str) -> HashMap<u32, f32> {
    let query_tokens = tokenize(query);
    let terms = query_tokens.distinct();
    if terms.is_empty() || index.doc_count == 0 {
        return HashMap::new();
    }

    let avgdl = index.average_doc_length();
    let n = index.doc_count as f32;
    let k1 = config::BM25_K1;
    let b = config::BM25_B;

    let mut scores: HashMap<u32, (f32, usize)> =
        HashMap::with_capacity(256.min(index.doc_count as usize));

    for token in &terms {
        let Some(postings) = index.index.get(*token) else {
            // Conjunctive predicate: one missing term rules out every document.
            return HashMap::new();
        };
        let df = postings.len() as f32;
        // IDF: log((N - df + 0.5) / (df + 0.5) + 1)
        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

        for posting in postings {
            let dl = index.doc_length(posting.doc_id) as f32;
            let tf = posting.term_frequency as f32;
            let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));

            let entry = scores.entry(posting.doc_id).or_insert((0.0, 0));
            entry.0 += idf * tf_norm;
            entry.1 += 1;
        }
    }

    let required = terms.len();
    scores
        .into_iter()
        .filter(|(_, (_, matched))| *matched == required)
        .map(|(id, (score, _))| (id, score))
        .collect()
}
