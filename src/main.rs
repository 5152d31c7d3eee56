//! Qid Cache - size-bounded cache of search-parameter objects
//!
//! Serves the qid cache over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qid_cache::api::{create_router, AppState};
use qid_cache::cache::QidCache;
use qid_cache::config::Config;
use qid_cache::store::{InMemoryGateway, JsonFileGateway, PersistenceGateway};
use qid_cache::tasks::EvictorHandle;

/// Main entry point for the qid cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Open the durable store
/// 4. Create the cache and start the background reclaim loop
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qid_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting qid cache server");

    let config = Config::from_env();
    config.validate().context("invalid cache bounds")?;
    info!(
        max_cache_size = config.max_cache_size,
        min_cache_size = config.min_cache_size,
        largest_cacheable_size = config.largest_cacheable_size,
        port = config.server_port,
        "Configuration loaded"
    );

    let gateway: Arc<dyn PersistenceGateway> = match &config.store_dir {
        Some(dir) => {
            let store = JsonFileGateway::open(dir)
                .await
                .with_context(|| format!("cannot open qid store at {}", dir.display()))?;
            info!("Durable store: JSON files under {}", dir.display());
            Arc::new(store)
        }
        None => {
            warn!("QID_STORE_DIR not set, durable store is in-memory only");
            Arc::new(InMemoryGateway::new())
        }
    };

    let cache = QidCache::from_config(&config, gateway)?;
    let evictor = cache.spawn_evictor();
    info!("Background reclaim loop started");

    let app = create_router(AppState::new(cache));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    stop_evictor(evictor).await;
    info!("Server shutdown complete");
    Ok(())
}

async fn stop_evictor(evictor: EvictorHandle) {
    evictor.shutdown().await;
    info!("Reclaim loop stopped");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
