//! Cache Proxy - a transparent TCP reverse proxy
//!
//! Forwards bytes between clients and one fixed upstream, answering repeated
//! GET requests from a short-lived in-memory cache.

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_proxy::api::{create_router, AppState};
use cache_proxy::cache::{self, CacheStore};
use cache_proxy::proxy::{resolve_addr, ProxyServer, SessionTracker};
use cache_proxy::{spawn_expiry_task, Config};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse flags (falling back to environment variables and defaults)
/// 3. Create the shared cache store
/// 4. Start the background expiry sweep
/// 5. Bind the proxy listener and, if configured, the admin API
/// 6. Accept connections until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    info!(
        "Configuration loaded: local={}, remote={}, cache_expiration={}s, buffer_size={}",
        config.local_addr, config.remote_addr, config.cache_expiration, config.buffer_size
    );

    let cache = cache::shared(CacheStore::new(config.cache_expiration()));
    let sessions = SessionTracker::new();

    let sweep_handle = (config.sweep_interval > 0)
        .then(|| spawn_expiry_task(cache.clone(), config.sweep_interval));

    let server = ProxyServer::bind(&config, cache.clone(), sessions.clone())
        .await
        .context("Failed to start proxy")?;

    let admin_handle = match &config.admin_addr {
        Some(addr) => {
            let addr = resolve_addr(addr).await?;
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind admin API on {}", addr))?;
            info!("Admin API listening on http://{}", addr);

            let app = create_router(AppState::new(cache.clone(), sessions.clone()));
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    error!("Admin API stopped: {}", e);
                }
            }))
        }
        None => None,
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown_signal() => {}
    }

    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Expiry sweep aborted");
    }
    if let Some(handle) = admin_handle {
        handle.abort();
    }

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
