//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cardscan::cache::{ManualClock, SessionCache};
use cardscan::gateway::{HandlerState, create_router_with_state};
use cardscan::{CardMatcher, CatalogIndex, CatalogItem, IndexKind, load_index};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::fixtures::{CatalogBuilder, DEFAULT_BITS, write_catalog};

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub bit_length: usize,
    pub index_kind: IndexKind,
    pub session_ttl: Duration,
    pub items: Option<Vec<CatalogItem>>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            bit_length: DEFAULT_BITS,
            index_kind: IndexKind::Trie,
            session_ttl: Duration::from_millis(750),
            items: None,
        }
    }
}

impl TestServerConfig {
    pub fn with_items(mut self, items: Vec<CatalogItem>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.index_kind = kind;
        self
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub clock: ManualClock,
    pub catalog_digest: String,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => tokio::time::sleep(interval).await,
        }
    }
}

/// Spawns a server over a catalog file written to a temp dir.
///
/// The session cache runs on a [`ManualClock`] exposed as [`TestServer::clock`], so
/// tests decide when sessions expire.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let items = config
        .items
        .unwrap_or_else(|| CatalogBuilder::new().bit_length(config.bit_length).build());
    let (temp_dir, path) = write_catalog(&items);

    let (index, digest): (CatalogIndex, String) =
        load_index(&path, config.index_kind, config.bit_length)
            .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let clock = ManualClock::new();
    let sessions = SessionCache::with_clock(config.session_ttl, Arc::new(clock.clone()));
    let matcher = CardMatcher::new(Arc::new(index), sessions);
    let state = HandlerState::new(Arc::new(matcher), digest.clone());
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let local_addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        clock,
        catalog_digest: digest,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
        _temp_dir: temp_dir,
    })
}
