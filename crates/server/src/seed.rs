//! Document ingestion at startup: the built-in sample set and JSON corpus files.
//!
//! Every document is embedded from its body through the shared
//! [`EmbeddingProvider`] before it is stored.

use crate::embedding::EmbeddingProvider;
use crate::store::{NewDocument, SearchStore, StorageError};
use hybridsearch_core::embedding::EncodingError;
use std::path::Path;

/// Failure while loading or ingesting documents.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid corpus file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// `(title, body)` pairs inserted by `--seed-samples`.
pub const SAMPLE_DOCUMENTS: [(&str, &str); 5] = [
    (
        "Unit Testing Benefits",
        "Unit tests improve software quality and reduce bugs.",
    ),
    (
        "Renewable Energy Storage",
        "Batteries and pumped hydro are common methods of energy storage.",
    ),
    (
        "Improve Page Performance",
        "Avoid render-blocking resources to enhance web page speed.",
    ),
    (
        "Test Coverage vs Confidence",
        "High test coverage does not always mean high confidence in software.",
    ),
    (
        "Store Vectors for Similarity Search",
        "Vectors can be stored in Postgres using pgvector for semantic search.",
    ),
];

/// The sample documents, without ids.
pub fn sample_documents() -> Vec<NewDocument> {
    SAMPLE_DOCUMENTS
        .iter()
        .map(|(title, body)| NewDocument {
            id: None,
            title: (*title).to_string(),
            body: (*body).to_string(),
        })
        .collect()
}

/// Reads a JSON array of `{"id"?, "title", "body"}` objects.
pub fn load_corpus_file(path: &Path) -> Result<Vec<NewDocument>, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let docs: Vec<NewDocument> = serde_json::from_str(&raw)?;
    Ok(docs)
}

/// Inserts the sample documents only into an empty store.
///
/// Ids come from the store, so seeding a non-empty store again would duplicate
/// them. Returns how many documents were inserted.
pub async fn seed_samples(
    store: &dyn SearchStore,
    embeddings: &EmbeddingProvider,
) -> Result<usize, SeedError> {
    let existing = store.document_count().await?;
    if existing > 0 {
        tracing::info!(
            backend = store.backend(),
            documents = existing,
            "Store already populated, skipping sample documents"
        );
        return Ok(0);
    }
    let ids = ingest(store, embeddings, sample_documents()).await?;
    Ok(ids.len())
}

/// Embeds and stores `docs` in order. Stops at the first failure.
///
/// Returns the ids assigned by the store.
pub async fn ingest(
    store: &dyn SearchStore,
    embeddings: &EmbeddingProvider,
    docs: Vec<NewDocument>,
) -> Result<Vec<i64>, SeedError> {
    let mut ids = Vec::with_capacity(docs.len());
    for doc in docs {
        let embedding = embeddings.embed(&doc.body).await?;
        let id = store.insert_document(doc, embedding).await?;
        ids.push(id);
    }
    tracing::info!(
        backend = store.backend(),
        inserted = ids.len(),
        "Documents ingested"
    );
    Ok(ids)
}
