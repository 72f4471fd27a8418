//! PostgreSQL backend: full-text search via `ts_rank` and vector similarity via
//! pgvector's cosine distance operator `<=>`.
//!
//! Expected schema (created by [`PgStore::ensure_schema`] when seeding):
//!
//! ```sql
//! CREATE TABLE documents (
//!     id        BIGSERIAL PRIMARY KEY,
//!     title     TEXT NOT NULL,
//!     body      TEXT NOT NULL,
//!     embedding vector(D)
//! );
//! ```
//!
//! The hybrid query evaluates both scores for every row inside one statement
//! and orders by the weighted sum before `LIMIT`, so no document is lost to
//! per-axis truncation.

use crate::store::{NewDocument, SearchStore, StorageError};
use async_trait::async_trait;
use hybridsearch_core::config;
use hybridsearch_core::document::Document;
use hybridsearch_core::search::{
    rank_hybrid, rank_lexical, rank_semantic, HybridCandidate, RankedResults,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;

const KEYWORD_SQL: &str = "\
SELECT d.id::int8 AS id, d.title, d.body,
       ts_rank(to_tsvector($2::regconfig, d.title || ' ' || d.body), q.query)::float8 AS score
FROM documents d, plainto_tsquery($2::regconfig, $1) AS q(query)
WHERE to_tsvector($2::regconfig, d.title || ' ' || d.body) @@ q.query
ORDER BY score DESC, id ASC
LIMIT $3";

// pgvector's `<=>` is NaN for a zero-norm vector, and Postgres sorts NaN above
// every number. Scores are cleaned to 0 before ORDER BY/LIMIT see them.
const SEMANTIC_SQL: &str = "\
WITH scored AS (
    SELECT d.id::int8 AS id, d.title, d.body,
           (1 - (d.embedding <=> $1::vector))::float8 AS raw_score
    FROM documents d
    WHERE d.embedding IS NOT NULL
)
SELECT id, title, body,
       CASE WHEN raw_score = 'NaN'::float8 THEN 0 ELSE raw_score END AS score
FROM scored
ORDER BY score DESC, id ASC
LIMIT $2";

const HYBRID_SQL: &str = "\
WITH scored AS (
    SELECT d.id::int8 AS id, d.title, d.body,
           to_tsvector($2::regconfig, d.title || ' ' || d.body) @@ q.query AS lexical_match,
           ts_rank(to_tsvector($2::regconfig, d.title || ' ' || d.body), q.query)::float8 AS fts_rank,
           (1 - (d.embedding <=> $3::vector))::float8 AS raw_vector_score
    FROM documents d, plainto_tsquery($2::regconfig, $1) AS q(query)
    WHERE d.embedding IS NOT NULL
),
ranked AS (
    SELECT id, title, body, lexical_match,
           CASE WHEN lexical_match THEN fts_rank ELSE 0 END AS fts_score,
           CASE WHEN raw_vector_score = 'NaN'::float8 THEN 0 ELSE raw_vector_score END AS vector_score
    FROM scored
)
SELECT id, title, body, lexical_match, fts_score, vector_score
FROM ranked
ORDER BY $4::float8 * fts_score + $5::float8 * vector_score DESC,
         id ASC
LIMIT $6";

#[derive(Debug, sqlx::FromRow)]
struct ScoredRow {
    id: i64,
    title: String,
    body: String,
    score: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct HybridRow {
    id: i64,
    title: String,
    body: String,
    lexical_match: Option<bool>,
    fts_score: Option<f64>,
    vector_score: Option<f64>,
}

/// Connection settings for [`PgStore::connect`].
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Text search configuration name, e.g. `english`.
    pub text_search_config: String,
}

/// pgvector-backed store with a bounded connection pool.
///
/// Each query checks a connection out of the pool and returns it when the
/// query future completes or is dropped.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    text_search_config: String,
}

/// Renders an embedding in pgvector's text input format: `[x1,x2,...]`.
fn vector_literal(embedding: &[f32]) -> String {
    let mut out = String::with_capacity(embedding.len() * 10 + 2);
    out.push('[');
    for (i, v) in embedding.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

/// Zero-norm vectors have no similarity. The SQL already maps NaN to 0; this
/// covers NULLs and anything else that slips through.
fn finite_or_zero(score: Option<f64>) -> f64 {
    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl PgStore {
    /// Opens the pool and waits for the first `min_connections` connections.
    pub async fn connect(cfg: &PgStoreConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .min_connections(cfg.min_connections)
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .connect(&cfg.database_url)
            .await?;
        tracing::info!(
            min_connections = cfg.min_connections,
            max_connections = cfg.max_connections,
            text_search_config = %cfg.text_search_config,
            "PostgreSQL pool ready"
        );
        Ok(Self {
            pool,
            text_search_config: cfg.text_search_config.clone(),
        })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool, text_search_config: impl Into<String>) -> Self {
        Self {
            pool,
            text_search_config: text_search_config.into(),
        }
    }

    /// Creates the pgvector extension and the `documents` table if missing.
    pub async fn ensure_schema(&self, dimension: usize) -> Result<(), StorageError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS documents (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                embedding vector({dimension})
            )"
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    fn to_hits(rows: Vec<ScoredRow>) -> Vec<(Arc<Document>, f64)> {
        rows.into_iter()
            .map(|row| {
                let score = finite_or_zero(row.score);
                (Arc::new(Document::new(row.id, row.title, row.body)), score)
            })
            .collect()
    }
}

#[async_trait]
impl SearchStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn keyword_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        let rows = sqlx::query_as::<_, ScoredRow>(KEYWORD_SQL)
            .bind(query)
            .bind(&self.text_search_config)
            .bind(limit_param(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rank_lexical(Self::to_hits(rows), limit))
    }

    async fn semantic_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        let rows = sqlx::query_as::<_, ScoredRow>(SEMANTIC_SQL)
            .bind(vector_literal(embedding))
            .bind(limit_param(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rank_semantic(Self::to_hits(rows), limit))
    }

    async fn hybrid_search(
        &self,
        query: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<RankedResults, StorageError> {
        let rows = sqlx::query_as::<_, HybridRow>(HYBRID_SQL)
            .bind(query)
            .bind(&self.text_search_config)
            .bind(vector_literal(embedding))
            .bind(config::HYBRID_LEXICAL_WEIGHT)
            .bind(config::HYBRID_SEMANTIC_WEIGHT)
            .bind(limit_param(limit))
            .fetch_all(&self.pool)
            .await?;
        let candidates = rows.into_iter().map(|row| HybridCandidate {
            document: Arc::new(Document::new(row.id, row.title, row.body)),
            lexical_score: if row.lexical_match.unwrap_or(false) {
                Some(finite_or_zero(row.fts_score))
            } else {
                None
            },
            semantic_score: finite_or_zero(row.vector_score),
        });
        Ok(rank_hybrid(candidates, limit))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn document_count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_document(
        &self,
        doc: NewDocument,
        embedding: Vec<f32>,
    ) -> Result<i64, StorageError> {
        let vector = vector_literal(&embedding);
        let id: i64 = match doc.id {
            Some(id) => {
                sqlx::query_scalar(
                    "INSERT INTO documents (id, title, body, embedding)
                     VALUES ($1, $2, $3, $4::vector) RETURNING id::int8",
                )
                .bind(id)
                .bind(&doc.title)
                .bind(&doc.body)
                .bind(vector)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    "INSERT INTO documents (title, body, embedding)
                     VALUES ($1, $2, $3::vector) RETURNING id::int8",
                )
                .bind(&doc.title)
                .bind(&doc.body)
                .bind(vector)
                .fetch_one(&self.pool)
                .await?
            }
        };
        Ok(id)
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}
