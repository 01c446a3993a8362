//! cardscan HTTP server entrypoint.
//!
//! Startup reads the reference catalog before the listener is bound, so a server that
//! accepts connections always has a full index behind it. `cardscan --health-check`
//! asks a running instance for `/healthz` and exits `0` when it answers, `1` otherwise.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use cardscan::cache::SessionCache;
use cardscan::catalog::{catalog_digest, load_catalog};
use cardscan::config::Config;
use cardscan::constants::is_published_bit_length;
use cardscan::gateway::{HandlerState, create_router_with_state};
use cardscan::index::{CatalogIndex, HashIndex, MemoizedIndex};
use cardscan::matcher::CardMatcher;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

type ServerIndex = MemoizedIndex<CatalogIndex>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().skip(1).any(|arg| arg == "--health-check") {
        std::process::exit(health_check().await);
    }

    init_tracing();

    let config = Config::from_env()?;
    config.validate()?;

    let state = load_state(&config).await?;
    serve(&config, state).await?;

    tracing::info!("cardscan shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cardscan=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Reads the catalog, builds the configured index and wraps it for serving.
async fn load_state(config: &Config) -> anyhow::Result<HandlerState<ServerIndex>> {
    if !is_published_bit_length(config.bit_length) {
        tracing::warn!(
            bit_length = config.bit_length,
            "Bit length is not one of the published catalog widths (64, 256, 1024)"
        );
    }

    let started = Instant::now();
    let path = config.catalog_path.clone();
    let (kind, bit_length) = (config.index_kind, config.bit_length);

    // Parsing and trie construction are CPU bound; keep them off the async workers.
    let (index, digest) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let items = load_catalog(&path, bit_length)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        let digest = catalog_digest(&items);
        let index = CatalogIndex::build(kind, items, bit_length)
            .with_context(|| format!("building {kind} index"))?;
        Ok((index, digest))
    })
    .await??;

    tracing::info!(
        summary = %index.summary(),
        digest = %digest,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Catalog loaded"
    );

    let index = MemoizedIndex::new(index, config.query_memo_capacity);
    let matcher = CardMatcher::new(Arc::new(index), SessionCache::new(config.session_ttl))
        .with_top_n(config.top_n)
        .with_tolerance(config.effective_tolerance());

    Ok(HandlerState::new(Arc::new(matcher), digest))
}

async fn serve(config: &Config, state: HandlerState<ServerIndex>) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(
        addr = %addr,
        tolerance = config.effective_tolerance(),
        top_n = config.top_n,
        session_ttl_ms = config.session_ttl.as_millis() as u64,
        query_memo = config.query_memo_capacity,
        "Server listening"
    );

    axum::serve(listener, create_router_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Runs on the server's own runtime; the process exits with the returned code.
async fn health_check() -> i32 {
    let url = match Config::from_env() {
        Ok(config) => config.health_check_url(),
        Err(e) => {
            eprintln!("cardscan health check: {e}");
            return 1;
        }
    };

    let client = match reqwest::Client::builder()
        .timeout(HEALTH_CHECK_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("cardscan health check: {e}");
            return 1;
        }
    };

    match client.get(&url).send().await {
        Ok(res) if res.status().is_success() => 0,
        Ok(res) => {
            eprintln!("cardscan health check: {url} returned {}", res.status());
            1
        }
        Err(e) => {
            eprintln!("cardscan health check: {url}: {e}");
            1
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
