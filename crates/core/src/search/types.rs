//! Search modes and scored result types.

use crate::config;
use crate::document::Document;
use std::fmt;
use std::sync::Arc;

/// Which relevance signals a query uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Lexical (full-text) ranking only.
    Keyword,
    /// Embedding similarity only.
    Semantic,
    /// Both signals, combined with fixed equal weights.
    #[default]
    Hybrid,
}

impl SearchMode {
    /// Parses a mode name. Matching is exact; any unrecognized name selects
    /// [`SearchMode::Hybrid`] rather than being rejected.
    pub fn parse(name: &str) -> Self {
        match name {
            "keyword" => SearchMode::Keyword,
            "semantic" => SearchMode::Semantic,
            // Permissive fallback: "hybrid" and every unknown value.
            _ => SearchMode::Hybrid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Keyword => "keyword",
            SearchMode::Semantic => "semantic",
            SearchMode::Hybrid => "hybrid",
        }
    }

    /// Whether this mode needs a query embedding.
    pub fn needs_embedding(&self) -> bool {
        !matches!(self, SearchMode::Keyword)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document with the relevance scores produced for one query.
///
/// - **Keyword**: only `lexical_score` (non-negative text rank)
/// - **Semantic**: only `semantic_score` (`1 - cosine distance`, in \[-1, 1\])
/// - **Hybrid**: both; `lexical_score` is `0.0` when the text predicate did not match
#[derive(Debug, Clone)]
pub struct ScoredResult {
    /// The matched document (shared reference).
    pub document: Arc<Document>,
    pub lexical_score: Option<f64>,
    pub semantic_score: Option<f64>,
}

impl ScoredResult {
    pub fn lexical(document: Arc<Document>, score: f64) -> Self {
        Self {
            document,
            lexical_score: Some(score),
            semantic_score: None,
        }
    }

    pub fn semantic(document: Arc<Document>, score: f64) -> Self {
        Self {
            document,
            lexical_score: None,
            semantic_score: Some(score),
        }
    }

    /// Hybrid result; a missing lexical score becomes [`config::NO_LEXICAL_MATCH_SCORE`].
    pub fn hybrid(document: Arc<Document>, lexical: Option<f64>, semantic: f64) -> Self {
        Self {
            document,
            lexical_score: Some(lexical.unwrap_or(config::NO_LEXICAL_MATCH_SCORE)),
            semantic_score: Some(semantic),
        }
    }

    pub fn id(&self) -> i64 {
        self.document.id
    }

    /// The score the result is ranked by: the single present score, or the
    /// weighted combination when both are present.
    pub fn ranking_score(&self) -> f64 {
        match (self.lexical_score, self.semantic_score) {
            (Some(lexical), Some(semantic)) => combined_score(lexical, semantic),
            (Some(lexical), None) => lexical,
            (None, Some(semantic)) => semantic,
            (None, None) => 0.0,
        }
    }
}

/// `HYBRID_LEXICAL_WEIGHT * lexical + HYBRID_SEMANTIC_WEIGHT * semantic`.
pub fn combined_score(lexical: f64, semantic: f64) -> f64 {
    config::HYBRID_LEXICAL_WEIGHT * lexical + config::HYBRID_SEMANTIC_WEIGHT * semantic
}

/// Ranked output of one search: results in descending ranking-score order.
#[derive(Debug, Clone)]
pub struct RankedResults {
    pub mode: SearchMode,
    pub results: Vec<ScoredResult>,
}

impl RankedResults {
    pub fn empty(mode: SearchMode) -> Self {
        Self {
            mode,
            results: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
