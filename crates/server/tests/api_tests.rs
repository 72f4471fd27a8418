use async_trait::async_trait;
use hybridsearch_core::embedding::{Embedder, HashEmbedder};
use hybridsearch_core::search::RankedResults;
use hybridsearch_server::api::create_router;
use hybridsearch_server::api::handlers::AppState;
use hybridsearch_server::embedding::EmbeddingProvider;
use hybridsearch_server::search::SearchOrchestrator;
use hybridsearch_server::store::{MemoryStore, NewDocument, SearchStore, StorageError};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const DIM: usize = 128;

const DOCS: [(i64, &str, &str); 5] = [
    (
        1,
        "Renewable Energy Storage",
        "Batteries and pumped hydro are common methods of energy storage.",
    ),
    (
        2,
        "Improve Page Performance",
        "Avoid render-blocking resources to enhance web page speed.",
    ),
    (
        3,
        "Test Coverage vs Confidence",
        "High test coverage does not always mean high confidence in software.",
    ),
    (
        5,
        "Unit Testing Benefits",
        "Unit tests improve software quality and reduce bugs.",
    ),
    (
        9,
        "Store Vectors for Similarity Search",
        "Vectors can be stored in Postgres using pgvector for semantic search.",
    ),
];

fn provider() -> EmbeddingProvider {
    EmbeddingProvider::preloaded(Arc::new(HashEmbedder::new(DIM)), 2, Duration::from_secs(5))
}

fn prometheus_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(_) => metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle(),
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(DIM));
    let embedder = HashEmbedder::new(DIM);
    for (id, title, body) in DOCS {
        store
            .insert_document(
                NewDocument {
                    id: Some(id),
                    title: title.to_string(),
                    body: body.to_string(),
                },
                embedder.embed(body).unwrap(),
            )
            .await
            .unwrap();
    }
    store
}

async fn spawn_app_with_store(store: Arc<dyn SearchStore>) -> String {
    let state = AppState {
        orchestrator: SearchOrchestrator::new(store, provider(), Duration::from_secs(5)),
        prometheus_handle: prometheus_handle(),
        start_time: std::time::Instant::now(),
    };

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

async fn spawn_app() -> String {
    spawn_app_with_store(seeded_store().await).await
}

fn client() -> Client {
    Client::new()
}

async fn search(base_url: &str, body: Value) -> reqwest::Response {
    client()
        .post(format!("{}/search", base_url))
        .json(&body)
        .send()
        .await
        .expect("Failed to search")
}

async fn search_ok(base_url: &str, body: Value) -> Value {
    let resp = search(base_url, body).await;
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

fn ids(body: &Value) -> Vec<i64> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect()
}

struct BrokenStore;

#[async_trait]
impl SearchStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn keyword_search(&self, _: &str, _: usize) -> Result<RankedResults, StorageError> {
        Err(StorageError::Timeout(Duration::from_secs(10)))
    }

    async fn semantic_search(&self, _: &[f32], _: usize) -> Result<RankedResults, StorageError> {
        Err(StorageError::Timeout(Duration::from_secs(10)))
    }

    async fn hybrid_search(
        &self,
        _: &str,
        _: &[f32],
        _: usize,
    ) -> Result<RankedResults, StorageError> {
        Err(StorageError::Timeout(Duration::from_secs(10)))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Timeout(Duration::from_secs(5)))
    }

    async fn document_count(&self) -> Result<u64, StorageError> {
        Ok(0)
    }

    async fn insert_document(&self, _: NewDocument, _: Vec<f32>) -> Result<i64, StorageError> {
        Ok(0)
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn health_returns_ok() {
    let base_url = spawn_app().await;

    let resp = client()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn ready_reports_backend_and_documents() {
    let base_url = spawn_app().await;

    let resp = client()
        .get(format!("{}/ready", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["documents"], 5);
}

#[tokio::test]
async fn ready_fails_when_store_is_down() {
    let base_url = spawn_app_with_store(Arc::new(BrokenStore)).await;

    let resp = client()
        .get(format!("{}/ready", base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Storage unavailable"));
}

#[tokio::test]
async fn empty_query_rejected_for_every_mode() {
    let base_url = spawn_app().await;

    for mode in ["keyword", "semantic", "hybrid", "fuzzy"] {
        for query in ["", "   ", "\n\t"] {
            let resp = search(&base_url, json!({ "query": query, "mode": mode })).await;
            assert_eq!(resp.status(), 400);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body, json!({ "detail": "Query cannot be empty." }));
        }
    }
}

#[tokio::test]
async fn keyword_finds_unit_testing_document() {
    let base_url = spawn_app().await;

    let body = search_ok(&base_url, json!({ "query": "unit tests", "mode": "keyword" })).await;

    let results = body["results"].as_array().unwrap();
    let hit = results
        .iter()
        .find(|r| r["id"] == 5)
        .expect("document 5 should match");
    assert_eq!(hit["title"], "Unit Testing Benefits");
    assert!(hit["fts_score"].as_f64().unwrap() > 0.0);
    assert_eq!(body["count"], results.len());
}

#[tokio::test]
async fn keyword_results_carry_only_fts_score() {
    let base_url = spawn_app().await;

    let body = search_ok(&base_url, json!({ "query": "software", "mode": "keyword" })).await;

    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty());
    let scores: Vec<f64> = results
        .iter()
        .map(|r| {
            assert!(r.get("vector_score").is_none());
            r["fts_score"].as_f64().unwrap()
        })
        .collect();
    assert!(scores.iter().all(|s| *s >= 0.0));
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn keyword_without_match_is_empty() {
    let base_url = spawn_app().await;

    let body = search_ok(&base_url, json!({ "query": "kubernetes", "mode": "keyword" })).await;
    assert_eq!(body, json!({ "results": [], "count": 0 }));
}

#[tokio::test]
async fn semantic_ranks_closest_document_first() {
    let base_url = spawn_app().await;

    let body = search_ok(
        &base_url,
        json!({
            "query": "Vectors can be stored in Postgres using pgvector for semantic search.",
            "mode": "semantic"
        }),
    )
    .await;

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), DOCS.len());
    assert_eq!(results[0]["id"], 9);
    let scores: Vec<f64> = results
        .iter()
        .map(|r| {
            assert!(r.get("fts_score").is_none());
            r["vector_score"].as_f64().unwrap()
        })
        .collect();
    assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!((scores[0] - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn hybrid_combines_and_zero_fills_lexical_score() {
    let base_url = spawn_app().await;

    let body = search_ok(&base_url, json!({ "query": "energy storage", "mode": "hybrid" })).await;

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), DOCS.len());
    let combined: Vec<f64> = results
        .iter()
        .map(|r| {
            let fts = r["fts_score"].as_f64().unwrap();
            let vector = r["vector_score"].as_f64().unwrap();
            if r["id"] != 1 {
                assert_eq!(fts, 0.0);
            } else {
                assert!(fts > 0.0);
            }
            0.5 * fts + 0.5 * vector
        })
        .collect();
    assert!(combined.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(results[0]["id"], 1);
}

#[tokio::test]
async fn missing_and_unknown_mode_behave_as_hybrid() {
    let base_url = spawn_app().await;

    let hybrid = search_ok(&base_url, json!({ "query": "software quality", "mode": "hybrid" })).await;
    let fuzzy = search_ok(&base_url, json!({ "query": "software quality", "mode": "fuzzy" })).await;
    let default = search_ok(&base_url, json!({ "query": "software quality" })).await;

    assert_eq!(hybrid, fuzzy);
    assert_eq!(hybrid, default);
    assert!(hybrid["results"][0].get("fts_score").is_some());
    assert!(hybrid["results"][0].get("vector_score").is_some());
}

#[tokio::test]
async fn empty_corpus_returns_no_results() {
    let base_url = spawn_app_with_store(Arc::new(MemoryStore::new(DIM))).await;

    for mode in ["keyword", "semantic", "hybrid"] {
        let body = search_ok(&base_url, json!({ "query": "anything", "mode": mode })).await;
        assert_eq!(body, json!({ "results": [], "count": 0 }));
    }
}

#[tokio::test]
async fn identical_queries_are_idempotent() {
    let base_url = spawn_app().await;

    for mode in ["keyword", "semantic", "hybrid"] {
        let request = json!({ "query": "test coverage software", "mode": mode });
        let first = search_ok(&base_url, request.clone()).await;
        let second = search_ok(&base_url, request).await;
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn limit_truncates_and_is_validated() {
    let base_url = spawn_app().await;

    let body = search_ok(&base_url, json!({ "query": "software", "mode": "semantic", "limit": 2 })).await;
    assert_eq!(body["count"], 2);
    assert_eq!(ids(&body).len(), 2);

    for limit in [0, 101] {
        let resp = search(&base_url, json!({ "query": "software", "limit": limit })).await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("limit"));
    }
}

#[tokio::test]
async fn storage_failure_returns_500_with_cause() {
    let base_url = spawn_app_with_store(Arc::new(BrokenStore)).await;

    for mode in ["keyword", "semantic", "hybrid"] {
        let resp = search(&base_url, json!({ "query": "anything", "mode": mode })).await;
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Search failed: "));
        assert!(detail.contains("timed out"));
    }
}

#[tokio::test]
async fn concurrent_searches_complete() {
    let base_url = spawn_app().await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let base_url = base_url.clone();
        let mode = ["keyword", "semantic", "hybrid"][i % 3];
        handles.push(tokio::spawn(async move {
            search(&base_url, json!({ "query": "software test", "mode": mode }))
                .await
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let base_url = spawn_app().await;

    let resp = client()
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();

    let request_id = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(request_id.len(), 36);
    assert_eq!(resp.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_request_body_too_large() {
    let base_url = spawn_app().await;

    let query = "a ".repeat(64 * 1024);
    let resp = search(&base_url, json!({ "query": query })).await;
    assert_eq!(resp.status(), 413);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let base_url = spawn_app().await;
    search_ok(&base_url, json!({ "query": "software", "mode": "keyword" })).await;

    let resp = client()
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
