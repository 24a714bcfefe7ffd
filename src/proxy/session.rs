//! Proxy Session
//!
//! One accepted client connection paired with one dialed upstream connection
//! and the two pumps between them.
//!
//! # Lifecycle
//! `Dialing -> Active -> Closed`. A failed dial ends only this session.
//! When either pump finishes, the other is aborted and joined, which drops
//! every socket half exactly once.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::SharedCache;
use crate::error::ProxyError;
use crate::proxy::pump::{pump_requests, pump_responses};

/// Process-wide counter for session identifiers.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a session, used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Opening the upstream connection
    Dialing,
    /// Both pumps running
    Active,
    /// Both connections released
    Closed,
}

// == Session Tracker ==
/// Counts live and total sessions across the process.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicU64>,
    total: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new session. The returned guard marks it closed on drop.
    pub fn track(&self) -> SessionGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            active: Arc::clone(&self.active),
            id: SessionId::new(),
        }
    }

    /// Sessions currently open.
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Sessions opened since startup.
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

/// Keeps a session counted as active for as long as it is held.
#[derive(Debug)]
pub struct SessionGuard {
    active: Arc<AtomicU64>,
    id: SessionId,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(session = %self.id, "Session released");
    }
}

// == Session ==
/// A client connection waiting to be proxied to the upstream.
#[derive(Debug)]
pub struct Session {
    guard: SessionGuard,
    client: TcpStream,
    peer: SocketAddr,
    upstream: SocketAddr,
    cache: SharedCache,
    buffer_size: usize,
}

impl Session {
    pub fn new(
        guard: SessionGuard,
        client: TcpStream,
        peer: SocketAddr,
        upstream: SocketAddr,
        cache: SharedCache,
        buffer_size: usize,
    ) -> Self {
        Self {
            guard,
            client,
            peer,
            upstream,
            cache,
            buffer_size,
        }
    }

    pub fn id(&self) -> SessionId {
        self.guard.id()
    }

    // == Run ==
    /// Dials the upstream and pumps bytes until either direction ends.
    ///
    /// Returns `ProxyError::Dial` if the upstream cannot be reached; stream
    /// failures are logged and end the session normally.
    pub async fn run(self) -> Result<(), ProxyError> {
        let id = self.id();
        debug!(session = %id, state = ?SessionState::Dialing, peer = %self.peer, upstream = %self.upstream);

        let upstream = TcpStream::connect(self.upstream)
            .await
            .map_err(|source| ProxyError::Dial {
                addr: self.upstream,
                source,
            })?;
        debug!(session = %id, state = ?SessionState::Active);

        let Session {
            guard,
            client,
            cache,
            buffer_size,
            peer,
            ..
        } = self;

        let (client_rx, client_tx) = client.into_split();
        let (upstream_rx, upstream_tx) = upstream.into_split();
        let client_tx = Arc::new(Mutex::new(client_tx));
        let (tag_tx, tag_rx) = mpsc::channel(1);

        let mut pumps = JoinSet::new();
        pumps.spawn(pump_requests(
            client_rx,
            upstream_tx,
            Arc::clone(&client_tx),
            cache.clone(),
            tag_tx,
            buffer_size,
        ));
        pumps.spawn(pump_responses(
            upstream_rx,
            client_tx,
            cache,
            tag_rx,
            buffer_size,
        ));

        // First pump to finish ends the session; join the other before closing.
        let first = pumps.join_next().await;
        pumps.abort_all();
        while pumps.join_next().await.is_some() {}

        match first {
            Some(Ok(Err(e))) => warn!("Session {} stream failed: {}", id, e),
            Some(Err(e)) if e.is_panic() => warn!("Pump for session {} panicked", id),
            _ => {}
        }

        debug!(session = %id, state = ?SessionState::Closed);
        info!("Closing session {} from {}", id, peer);
        drop(guard);
        Ok(())
    }
}
