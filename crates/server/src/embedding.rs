//! Embedding provider.
//!
//! Wraps a blocking [`Embedder`] for use from async handlers:
//! - the model is loaded lazily on first use, exactly once even under
//!   concurrent first requests (`tokio::sync::OnceCell`), bounded by a load timeout
//! - every encode runs on tokio's blocking pool, gated by a semaphore so at
//!   most `workers` encodes run at a time; callers suspend while waiting
//! - waiting for a worker plus the encode itself share one per-call deadline

use crate::api::metrics;
use hybridsearch_core::embedding::{validate_embedding, Embedder, EncodingError, HashEmbedder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, Semaphore};

/// Builds the embedder. Runs at most once per successful load, on a blocking thread.
pub type EmbedderLoader =
    Arc<dyn Fn() -> Result<Arc<dyn Embedder>, EncodingError> + Send + Sync>;

/// Which encoder backs the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EmbedderKind {
    /// Deterministic feature hashing. No model files.
    #[default]
    Hash,
    /// Pretrained all-MiniLM-L6-v2 (requires the `minilm` feature).
    Minilm,
}

impl EmbedderKind {
    /// Whether this binary can build the encoder.
    pub fn is_available(&self) -> bool {
        match self {
            EmbedderKind::Hash => true,
            EmbedderKind::Minilm => cfg!(feature = "minilm"),
        }
    }
}

/// Returns a loader for `kind`. `model_id` is only used by [`EmbedderKind::Minilm`].
pub fn loader_for(kind: EmbedderKind, dimension: usize, model_id: &str) -> EmbedderLoader {
    match kind {
        EmbedderKind::Hash => Arc::new(move || -> Result<Arc<dyn Embedder>, EncodingError> {
            Ok(Arc::new(HashEmbedder::new(dimension)))
        }),
        EmbedderKind::Minilm => minilm_loader(model_id.to_string()),
    }
}

#[cfg(feature = "minilm")]
fn minilm_loader(model_id: String) -> EmbedderLoader {
    use hybridsearch_core::embedding::MiniLmEmbedder;
    Arc::new(move || -> Result<Arc<dyn Embedder>, EncodingError> {
        Ok(Arc::new(MiniLmEmbedder::load(&model_id)?))
    })
}

#[cfg(not(feature = "minilm"))]
fn minilm_loader(_model_id: String) -> EmbedderLoader {
    Arc::new(|| -> Result<Arc<dyn Embedder>, EncodingError> {
        Err(EncodingError::ModelLoad(
            "built without the `minilm` feature".into(),
        ))
    })
}

struct Inner {
    loader: EmbedderLoader,
    model: OnceCell<Arc<dyn Embedder>>,
    workers: Arc<Semaphore>,
    dimension: usize,
    timeout: Duration,
    load_timeout: Duration,
}

/// Process-wide embedding provider. Cloning yields a handle to the same model and pool.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: Arc<Inner>,
}

impl EmbeddingProvider {
    /// Creates a provider whose model is built by `loader` on first use.
    ///
    /// `timeout` bounds each embed call (worker wait plus encode); `load_timeout`
    /// bounds the one-time model load.
    pub fn new(
        dimension: usize,
        workers: usize,
        timeout: Duration,
        load_timeout: Duration,
        loader: EmbedderLoader,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                model: OnceCell::new(),
                workers: Arc::new(Semaphore::new(workers.max(1))),
                dimension,
                timeout,
                load_timeout,
            }),
        }
    }

    /// Creates a provider around an already-built embedder.
    pub fn preloaded(embedder: Arc<dyn Embedder>, workers: usize, timeout: Duration) -> Self {
        let dimension = embedder.dimension();
        let model = OnceCell::new_with(Some(Arc::clone(&embedder)));
        let loader: EmbedderLoader =
            Arc::new(move || -> Result<Arc<dyn Embedder>, EncodingError> {
                Ok(Arc::clone(&embedder))
            });
        Self {
            inner: Arc::new(Inner {
                loader,
                model,
                workers: Arc::new(Semaphore::new(workers.max(1))),
                dimension,
                timeout,
                load_timeout: timeout,
            }),
        }
    }

    /// Output dimension every embedding is checked against.
    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.model.initialized()
    }

    async fn model(&self) -> Result<Arc<dyn Embedder>, EncodingError> {
        let load_timeout = self.inner.load_timeout;
        let model = self
            .inner
            .model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.inner.loader);
                tracing::info!(dimension = self.inner.dimension, "Loading embedding model");
                let start = Instant::now();
                // A timed-out load leaves the cell empty; the next caller retries.
                let task = tokio::task::spawn_blocking(move || (*loader)());
                let model = match tokio::time::timeout(load_timeout, task).await {
                    Err(_) => return Err(EncodingError::Timeout(load_timeout)),
                    Ok(Err(join_err)) => return Err(EncodingError::Worker(join_err.to_string())),
                    Ok(Ok(result)) => result?,
                };
                if model.dimension() != self.inner.dimension {
                    return Err(EncodingError::DimensionMismatch {
                        expected: self.inner.dimension,
                        actual: model.dimension(),
                    });
                }
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Embedding model ready"
                );
                Ok(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// Loads the model now instead of on the first request.
    pub async fn warm_up(&self) -> Result<(), EncodingError> {
        self.model().await.map(|_| ())
    }

    /// Encodes `text` on the worker pool.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        if text.trim().is_empty() {
            return Err(EncodingError::EmptyInput);
        }
        let model = self.model().await?;

        let timeout = self.inner.timeout;
        let deadline = tokio::time::Instant::now() + timeout;
        let workers = Arc::clone(&self.inner.workers);
        let permit = tokio::time::timeout_at(deadline, workers.acquire_owned())
            .await
            .map_err(|_| EncodingError::Timeout(timeout))?
            .map_err(|e| EncodingError::Worker(e.to_string()))?;
        let text = text.to_owned();
        let start = Instant::now();
        // The permit moves into the blocking task: a timed-out caller does not
        // free a worker slot while its encode is still running.
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            model.embed(&text)
        });

        let embedding = match tokio::time::timeout_at(deadline, task).await {
            Err(_) => return Err(EncodingError::Timeout(timeout)),
            Ok(Err(join_err)) => return Err(EncodingError::Worker(join_err.to_string())),
            Ok(Ok(result)) => result?,
        };
        metrics::record_embedding(start.elapsed());

        validate_embedding(&embedding, self.inner.dimension)?;
        Ok(embedding)
    }
}
