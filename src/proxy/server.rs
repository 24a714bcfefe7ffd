//! Proxy Listener
//!
//! Binds the local address and hands every accepted connection to its own
//! session task.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpListener};
use tracing::{error, info, warn};

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::ProxyError;
use crate::proxy::session::{Session, SessionTracker};

/// Pause after a failed accept, so persistent errors such as fd exhaustion
/// do not spin the loop.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Resolves `host:port` (or `:port` for all interfaces) to a socket address.
///
/// The first address returned by the resolver is used.
pub async fn resolve_addr(addr: &str) -> Result<SocketAddr, ProxyError> {
    let candidate = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    let resolution_error = |source| ProxyError::AddressResolution {
        addr: addr.to_string(),
        source,
    };

    let resolved = lookup_host(candidate.as_str())
        .await
        .map_err(resolution_error)?
        .next()
        .ok_or_else(|| {
            resolution_error(io::Error::new(
                io::ErrorKind::NotFound,
                "no addresses returned",
            ))
        });
    resolved
}

// == Proxy Server ==
/// Accept loop forwarding every client to one fixed upstream.
#[derive(Debug)]
pub struct ProxyServer {
    listener: TcpListener,
    upstream: SocketAddr,
    cache: SharedCache,
    sessions: SessionTracker,
    buffer_size: usize,
}

impl ProxyServer {
    // == Bind ==
    /// Resolves both addresses from `config` and binds the local listener.
    pub async fn bind(
        config: &Config,
        cache: SharedCache,
        sessions: SessionTracker,
    ) -> Result<Self, ProxyError> {
        let local = resolve_addr(&config.local_addr).await?;
        let upstream = resolve_addr(&config.remote_addr).await?;

        let listener = TcpListener::bind(local)
            .await
            .map_err(|source| ProxyError::Listen {
                addr: local,
                source,
            })?;

        let bound = listener
            .local_addr()
            .map_err(|source| ProxyError::Listen {
                addr: local,
                source,
            })?;
        let expiration = cache.read().await.expiration();
        info!(
            "Proxy started on port {} and forwards to port {} (cache expiration: {}s)",
            bound.port(),
            upstream.port(),
            expiration.as_secs_f64()
        );

        Ok(Self {
            listener,
            upstream,
            cache,
            sessions,
            buffer_size: config.buffer_size,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    // == Run ==
    /// Accepts connections forever.
    ///
    /// Accept failures and failed sessions are logged; neither stops the loop.
    pub async fn run(self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("{}", ProxyError::Accept(e));
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };

            let guard = self.sessions.track();
            let session = Session::new(
                guard,
                stream,
                peer,
                self.upstream,
                self.cache.clone(),
                self.buffer_size,
            );
            let id = session.id();
            info!("Accepted session {} from {}", id, peer);

            tokio::spawn(async move {
                if let Err(e) = session.run().await {
                    error!("Session {} aborted: {}", id, e);
                }
            });
        }
    }
}
