//! Expiry Sweep Task
//!
//! Background task that periodically clears stale cached bodies. Entries stay
//! in the store; only their bodies are dropped, as a stale lookup would do.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that clears stale bodies every `interval_secs`.
///
/// The returned JoinHandle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = cache::shared(CacheStore::new(Duration::from_secs(4)));
/// let sweep = spawn_expiry_task(cache.clone(), 1);
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_expiry_task(cache: SharedCache, interval_secs: u64) -> JoinHandle<()> {
    spawn_with_interval(cache, Duration::from_secs(interval_secs))
}

fn spawn_with_interval(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let cleared = cache.write().await.expire_stale();

            if cleared > 0 {
                info!("Expiry sweep: cleared {} stale entries", cleared);
            } else {
                debug!("Expiry sweep: nothing stale");
            }
        }
    })
}
