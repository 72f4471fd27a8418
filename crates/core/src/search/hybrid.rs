//! Hybrid merge engine.
//!
//! Turns raw scorer output into the final ranked, deduplicated, truncated list:
//! - **Keyword**: lexical hits ordered by lexical score
//! - **Semantic**: semantic hits ordered by semantic score
//! - **Hybrid**: every candidate carries both scores and is ordered by
//!   `0.5 * lexical + 0.5 * semantic`, computed before truncation
//!
//! Ties on the ranking score are broken by document id ascending, so the
//! output is deterministic for a fixed corpus. The engine keeps no state
//! between calls.

use crate::document::Document;
use crate::search::types::{RankedResults, ScoredResult, SearchMode};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

/// A document scored on both axes before truncation.
///
/// `lexical_score` is `None` when the text predicate did not match; the merge
/// engine substitutes [`crate::config::NO_LEXICAL_MATCH_SCORE`].
#[derive(Debug, Clone)]
pub struct HybridCandidate {
    pub document: Arc<Document>,
    pub lexical_score: Option<f64>,
    pub semantic_score: f64,
}

/// Orders lexical hits by score and keeps the top `limit`.
pub fn rank_lexical(
    hits: impl IntoIterator<Item = (Arc<Document>, f64)>,
    limit: usize,
) -> RankedResults {
    let results = hits
        .into_iter()
        .map(|(document, score)| ScoredResult::lexical(document, score))
        .collect();
    RankedResults {
        mode: SearchMode::Keyword,
        results: top_k(results, limit),
    }
}

/// Orders semantic hits by score and keeps the top `limit`.
pub fn rank_semantic(
    hits: impl IntoIterator<Item = (Arc<Document>, f64)>,
    limit: usize,
) -> RankedResults {
    let results = hits
        .into_iter()
        .map(|(document, score)| ScoredResult::semantic(document, score))
        .collect();
    RankedResults {
        mode: SearchMode::Semantic,
        results: top_k(results, limit),
    }
}

/// Combines both scores for every candidate, then orders and truncates.
///
/// Callers must pass every document considered, not a pre-truncated list per
/// axis; a document strong on one axis must not be lost because it fell out of
/// the other axis's top-k.
pub fn rank_hybrid(
    candidates: impl IntoIterator<Item = HybridCandidate>,
    limit: usize,
) -> RankedResults {
    let results = candidates
        .into_iter()
        .map(|c| ScoredResult::hybrid(c.document, c.lexical_score, c.semantic_score))
        .collect();
    RankedResults {
        mode: SearchMode::Hybrid,
        results: top_k(results, limit),
    }
}

type RankKey = (OrderedFloat<f64>, Reverse<i64>);

/// Higher key = better rank. NaN sorts last.
fn rank_key(result: &ScoredResult) -> RankKey {
    let score = result.ranking_score();
    let score = if score.is_nan() { f64::NEG_INFINITY } else { score };
    (OrderedFloat(score), Reverse(result.id()))
}

/// Deduplicates by document id (keeping the better-ranked entry) and returns
/// the best `limit` results in descending order.
fn top_k(results: Vec<ScoredResult>, limit: usize) -> Vec<ScoredResult> {
    if limit == 0 || results.is_empty() {
        return Vec::new();
    }

    let mut best: HashMap<i64, usize> = HashMap::with_capacity(results.len());
    for (idx, result) in results.iter().enumerate() {
        match best.entry(result.id()) {
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
            Entry::Occupied(mut slot) => {
                if rank_key(result) > rank_key(&results[*slot.get()]) {
                    slot.insert(idx);
                }
            }
        }
    }

    // Partial sort: O(n log k) via min-heap of size k
    let mut heap: BinaryHeap<Reverse<(RankKey, usize)>> = BinaryHeap::with_capacity(limit + 1);
    for idx in best.into_values() {
        heap.push(Reverse((rank_key(&results[idx]), idx)));
        if heap.len() > limit {
            heap.pop();
        }
    }

    let mut keep: Vec<(RankKey, usize)> = heap.into_iter().map(|Reverse(entry)| entry).collect();
    keep.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut slots: Vec<Option<ScoredResult>> = results.into_iter().map(Some).collect();
    keep.into_iter()
        .filter_map(|(_, idx)| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::combined_score;

    fn doc(id: i64) -> Arc<Document> {
        Arc::new(Document::new(id, format!("title {id}"), format!("body {id}")))
    }

    fn ids(ranked: &RankedResults) -> Vec<i64> {
        ranked.results.iter().map(ScoredResult::id).collect()
    }

    fn candidate(id: i64, lexical: Option<f64>, semantic: f64) -> HybridCandidate {
        HybridCandidate {
            document: doc(id),
            lexical_score: lexical,
            semantic_score: semantic,
        }
    }

    #[test]
    fn test_lexical_sorted_descending_with_only_lexical_score() {
        let ranked = rank_lexical(vec![(doc(1), 0.1), (doc(2), 0.7), (doc(3), 0.4)], 10);
        assert_eq!(ranked.mode, SearchMode::Keyword);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        for r in &ranked.results {
            assert!(r.lexical_score.is_some());
            assert!(r.semantic_score.is_none());
        }
    }

    #[test]
    fn test_semantic_sorted_descending_with_only_semantic_score() {
        let ranked = rank_semantic(vec![(doc(1), -0.5), (doc(2), 0.9), (doc(3), 0.0)], 10);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        for r in &ranked.results {
            assert!(r.lexical_score.is_none());
            assert!(r.semantic_score.is_some());
        }
    }

    #[test]
    fn test_ties_broken_by_id_ascending() {
        let ranked = rank_lexical(vec![(doc(9), 0.5), (doc(3), 0.5), (doc(5), 0.5)], 10);
        assert_eq!(ids(&ranked), vec![3, 5, 9]);

        let ranked = rank_hybrid(
            vec![
                candidate(4, Some(0.2), 0.4),
                candidate(2, Some(0.4), 0.2),
                candidate(7, None, 0.6),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec![2, 4, 7]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let hits: Vec<_> = (0..50).map(|i| (doc(i), i as f64)).collect();
        let ranked = rank_semantic(hits, 5);
        assert_eq!(ranked.count(), 5);
        assert_eq!(ids(&ranked), vec![49, 48, 47, 46, 45]);
        assert!(rank_semantic(vec![(doc(1), 1.0)], 0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_lexical(Vec::new(), 10).is_empty());
        assert!(rank_semantic(Vec::new(), 10).is_empty());
        assert!(rank_hybrid(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_hybrid_missing_lexical_is_exactly_zero() {
        let ranked = rank_hybrid(vec![candidate(1, None, 0.9), candidate(2, Some(1.2), 0.1)], 10);
        let one = ranked.results.iter().find(|r| r.id() == 1).unwrap();
        assert_eq!(one.lexical_score, Some(0.0));
        assert_eq!(one.semantic_score, Some(0.9));
    }

    #[test]
    fn test_hybrid_combined_score_non_increasing() {
        let candidates = vec![
            candidate(1, Some(0.06), 0.31),
            candidate(2, None, 0.72),
            candidate(3, Some(0.09), 0.55),
            candidate(4, None, -0.2),
            candidate(5, Some(0.01), 0.05),
        ];
        let ranked = rank_hybrid(candidates, 10);
        let combined: Vec<f64> = ranked
            .results
            .iter()
            .map(|r| combined_score(r.lexical_score.unwrap(), r.semantic_score.unwrap()))
            .collect();
        assert!(combined.windows(2).all(|w| w[0] >= w[1]), "{combined:?}");
    }

    #[test]
    fn test_hybrid_no_lexical_matches_preserves_semantic_order() {
        let ranked = rank_hybrid(
            vec![
                candidate(1, None, 0.2),
                candidate(2, None, 0.9),
                candidate(3, None, 0.5),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
        // The 0.5 weighting halves the best achievable score.
        assert!((ranked.results[0].ranking_score() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_hybrid_scores_before_truncation() {
        // Doc 1 is best lexically but mediocre semantically; doc 2 is the reverse.
        // Neither may be dropped just because it misses one axis's top-1.
        let ranked = rank_hybrid(
            vec![
                candidate(1, Some(0.9), 0.3),
                candidate(2, None, 0.95),
                candidate(3, Some(0.1), 0.4),
            ],
            2,
        );
        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_duplicates_are_merged() {
        let ranked = rank_lexical(vec![(doc(1), 0.2), (doc(1), 0.6), (doc(2), 0.4)], 10);
        assert_eq!(ids(&ranked), vec![1, 2]);
        assert_eq!(ranked.results[0].lexical_score, Some(0.6));
    }

    #[test]
    fn test_nan_ranks_last() {
        let ranked = rank_semantic(vec![(doc(1), f64::NAN), (doc(2), -0.9)], 10);
        assert_eq!(ids(&ranked), vec![2, 1]);
    }
}
