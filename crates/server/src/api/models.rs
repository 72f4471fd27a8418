//! Request and response data transfer objects for the REST API.
//!
//! All types derive `Serialize` and/or `Deserialize` for JSON marshalling via Axum.

use hybridsearch_core::search::{RankedResults, ScoredResult};
use serde::{Deserialize, Serialize};

/// Request body for `POST /search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// `keyword`, `semantic` or `hybrid`; anything else is treated as hybrid.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A single search result.
///
/// `fts_score` is present for keyword and hybrid searches, `vector_score` for
/// semantic and hybrid searches.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fts_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f64>,
}

impl From<&ScoredResult> for SearchHit {
    fn from(result: &ScoredResult) -> Self {
        Self {
            id: result.document.id,
            title: result.document.title.clone(),
            body: result.document.body.clone(),
            fts_score: result.lexical_score,
            vector_score: result.semantic_score,
        }
    }
}

/// Response body for `POST /search`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub count: usize,
}

impl From<RankedResults> for SearchResponse {
    fn from(ranked: RankedResults) -> Self {
        let results: Vec<SearchHit> = ranked.results.iter().map(SearchHit::from).collect();
        Self {
            count: results.len(),
            results,
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Response body for `GET /ready`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub backend: String,
    pub documents: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridsearch_core::document::Document;
    use hybridsearch_core::search::SearchMode;
    use std::sync::Arc;

    #[test]
    fn test_absent_scores_are_omitted() {
        let doc = Arc::new(Document::new(5, "Unit Testing Benefits", "Unit tests"));
        let ranked = RankedResults {
            mode: SearchMode::Keyword,
            results: vec![ScoredResult::lexical(doc, 0.25)],
        };
        let json = serde_json::to_value(SearchResponse::from(ranked)).unwrap();
        assert_eq!(json["count"], 1);
        let hit = &json["results"][0];
        assert_eq!(hit["id"], 5);
        assert_eq!(hit["fts_score"], 0.25);
        assert!(hit.get("vector_score").is_none());
    }

    #[test]
    fn test_hybrid_zero_lexical_score_is_serialized() {
        let doc = Arc::new(Document::new(3, "t", "b"));
        let ranked = RankedResults {
            mode: SearchMode::Hybrid,
            results: vec![ScoredResult::hybrid(doc, None, 0.5)],
        };
        let json = serde_json::to_value(SearchResponse::from(ranked)).unwrap();
        assert_eq!(json["results"][0]["fts_score"], 0.0);
        assert_eq!(json["results"][0]["vector_score"], 0.5);
    }

    #[test]
    fn test_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(req.query, "rust");
        assert!(req.mode.is_none());
        assert!(req.limit.is_none());
    }
}
