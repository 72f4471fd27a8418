//! HTTP request handlers and shared application state.

use crate::api::errors::ApiError;
use crate::api::models::*;
use crate::search::{SearchOrchestrator, SearchQuery};
use axum::extract::State;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use std::time::Instant;

/// Shared application state passed to every handler via Axum's `State` extractor.
///
/// The orchestrator owns the store and the embedding provider, both built once
/// at startup.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: SearchOrchestrator,
    pub prometheus_handle: PrometheusHandle,
    pub start_time: Instant,
}

/// `GET /health`: liveness only, touches no dependency.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// `GET /ready`: one round-trip to the store.
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadyResponse>, ApiError> {
    let store = state.orchestrator.store();
    let check = match store.ping().await {
        Ok(()) => store.document_count().await,
        Err(e) => Err(e),
    };
    match check {
        Ok(documents) => Ok(Json(ReadyResponse {
            status: "ready".to_string(),
            backend: store.backend().to_string(),
            documents,
        })),
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "Readiness check failed");
            Err(ApiError::ServiceUnavailable(format!("Storage unavailable: {e}")))
        }
    }
}

/// `POST /search`: ranks documents for a query in keyword, semantic or hybrid mode.
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = SearchQuery::new(&req.query, req.mode.as_deref(), req.limit)?;
    let ranked = state.orchestrator.search(&query).await?;
    Ok(Json(SearchResponse::from(ranked)))
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics_endpoint(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}
