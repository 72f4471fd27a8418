//! Prometheus metrics recording and background collection.

use crate::store::SearchStore;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records a search outcome (`ok` or `error`) for a mode.
pub fn record_search(mode: &str, outcome: &str) {
    counter!(
        "hybridsearch_search_total",
        "mode" => mode.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Records the wall time of one query or document encode.
pub fn record_embedding(duration: Duration) {
    histogram!("hybridsearch_embedding_duration_seconds").record(duration.as_secs_f64());
}

/// Updates the `hybridsearch_corpus_documents` gauge from the store.
pub async fn update_corpus_metrics(store: &dyn SearchStore) {
    match store.document_count().await {
        Ok(count) => gauge!("hybridsearch_corpus_documents").set(count as f64),
        Err(e) => tracing::warn!(error = %e, "Could not count documents for metrics"),
    }
}
