use clap::Parser;
use hybridsearch_core::config;
use hybridsearch_server::api::create_router;
use hybridsearch_server::api::handlers::AppState;
use hybridsearch_server::api::metrics;
use hybridsearch_server::embedding::{loader_for, EmbedderKind, EmbeddingProvider};
use hybridsearch_server::search::SearchOrchestrator;
use hybridsearch_server::seed;
use hybridsearch_server::store::{MemoryStore, PgStore, PgStoreConfig, SearchStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hybridsearch", about = "Keyword, semantic and hybrid document search")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// PostgreSQL connection URL (omit to serve from memory)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Connections kept open in the pool
    #[arg(long, default_value_t = config::DEFAULT_POOL_MIN_CONNECTIONS)]
    pool_min_connections: u32,

    /// Upper bound on pooled connections
    #[arg(long, default_value_t = config::DEFAULT_POOL_MAX_CONNECTIONS)]
    pool_max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[arg(long, default_value_t = config::DEFAULT_ACQUIRE_TIMEOUT_SECS)]
    acquire_timeout: u64,

    /// Per-query storage timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_STORAGE_TIMEOUT_SECS)]
    storage_timeout: u64,

    /// Embedding worker pool size
    #[arg(long, default_value_t = config::DEFAULT_EMBED_WORKERS)]
    embed_workers: usize,

    /// Per-encode timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_EMBED_TIMEOUT_SECS)]
    embed_timeout: u64,

    /// Seconds allowed for the one-time model load
    #[arg(long, default_value_t = config::DEFAULT_MODEL_LOAD_TIMEOUT_SECS)]
    model_load_timeout: u64,

    /// Sentence encoder: `hash` (built in) or `minilm` (needs the `minilm` feature)
    #[arg(long, env = "EMBEDDER", value_enum, default_value_t = EmbedderKind::Hash)]
    embedder: EmbedderKind,

    /// HuggingFace model id for `--embedder minilm`
    #[arg(long, default_value = config::DEFAULT_MINILM_MODEL)]
    model: String,

    /// Embedding dimension (must match the `documents.embedding` column)
    #[arg(long, default_value_t = config::DEFAULT_EMBEDDING_DIMENSION)]
    embedding_dimension: usize,

    /// PostgreSQL text search configuration
    #[arg(long, default_value = config::DEFAULT_TEXT_SEARCH_CONFIG)]
    text_search_config: String,

    /// JSON file with an array of {"id"?, "title", "body"} to ingest at startup
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Insert the built-in sample documents at startup when the store is empty
    #[arg(long, default_value_t = false)]
    seed_samples: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    shutdown_timeout: u64,
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.port == 0 {
        return Err("port must be > 0".into());
    }
    if args.pool_max_connections == 0 || args.pool_max_connections > config::MAX_POOL_CONNECTIONS {
        return Err(format!(
            "pool-max-connections must be 1-{}",
            config::MAX_POOL_CONNECTIONS
        ));
    }
    if args.pool_min_connections == 0 || args.pool_min_connections > args.pool_max_connections {
        return Err("pool-min-connections must be between 1 and pool-max-connections".into());
    }
    if args.embedding_dimension == 0 || args.embedding_dimension > config::MAX_EMBEDDING_DIMENSION {
        return Err(format!(
            "embedding-dimension must be 1-{}",
            config::MAX_EMBEDDING_DIMENSION
        ));
    }
    if args.embed_workers == 0 {
        return Err("embed-workers must be > 0".into());
    }
    if !args.embedder.is_available() {
        return Err("embedder 'minilm' requires a build with --features minilm".into());
    }
    if args.acquire_timeout == 0
        || args.storage_timeout == 0
        || args.embed_timeout == 0
        || args.model_load_timeout == 0
    {
        return Err("timeouts must be > 0".into());
    }
    if args.text_search_config.trim().is_empty() {
        return Err("text-search-config must not be empty".into());
    }
    if let Some(ref path) = args.corpus {
        if !path.is_file() {
            return Err(format!("corpus '{}' is not a file", path.display()));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hybridsearch_server=info".parse()?)
                .add_directive("hybridsearch_core=info".parse()?),
        )
        .init();

    let args = Args::parse();
    if let Err(msg) = validate_args(&args) {
        eprintln!("Error: {msg}");
        std::process::exit(1);
    }

    let prometheus_handle =
        metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let dimension = args.embedding_dimension;
    let embeddings = EmbeddingProvider::new(
        dimension,
        args.embed_workers,
        Duration::from_secs(args.embed_timeout),
        Duration::from_secs(args.model_load_timeout),
        loader_for(args.embedder, dimension, &args.model),
    );

    let store: Arc<dyn SearchStore> = match args.database_url {
        Some(ref database_url) => {
            let pg = PgStore::connect(&PgStoreConfig {
                database_url: database_url.clone(),
                min_connections: args.pool_min_connections,
                max_connections: args.pool_max_connections,
                acquire_timeout: Duration::from_secs(args.acquire_timeout),
                text_search_config: args.text_search_config.clone(),
            })
            .await?;
            if args.seed_samples || args.corpus.is_some() {
                pg.ensure_schema(dimension).await?;
            }
            if args.embedder == EmbedderKind::Hash {
                tracing::warn!(
                    "Hash embedder on PostgreSQL: stored embeddings must come from the same embedder"
                );
            }
            Arc::new(pg)
        }
        None => Arc::new(MemoryStore::new(dimension)),
    };

    if args.seed_samples {
        seed::seed_samples(store.as_ref(), &embeddings).await?;
    }
    if let Some(ref path) = args.corpus {
        let docs = seed::load_corpus_file(path)?;
        tracing::info!(path = %path.display(), documents = docs.len(), "Loading corpus");
        seed::ingest(store.as_ref(), &embeddings, docs).await?;
    }

    let document_count = store.document_count().await?;
    let orchestrator = SearchOrchestrator::new(
        Arc::clone(&store),
        embeddings,
        Duration::from_secs(args.storage_timeout),
    );

    let state = AppState {
        orchestrator,
        prometheus_handle,
        start_time: Instant::now(),
    };
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", args.port);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        backend = store.backend(),
        documents = document_count,
        embedding_dimension = dimension,
        embed_workers = args.embed_workers,
        embedder = ?args.embedder,
        "hybridsearch ready"
    );

    // Spawn corpus metrics background task
    let metrics_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(15));
        loop {
            interval.tick().await;
            metrics::update_corpus_metrics(metrics_store.as_ref()).await;
        }
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await?;

    close_store(store.as_ref(), args.shutdown_timeout).await;

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Shutting down gracefully, draining in-flight requests...");
}

async fn close_store(store: &dyn SearchStore, timeout_secs: u64) {
    tracing::info!("All requests drained, closing {} store...", store.backend());
    let deadline = Duration::from_secs(timeout_secs);
    if tokio::time::timeout(deadline, store.close()).await.is_err() {
        tracing::error!(
            "Shutdown timeout ({}s) exceeded while closing the store",
            timeout_secs
        );
    }
}
