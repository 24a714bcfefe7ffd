//! Cache Module
//!
//! Request classification and the shared response cache.

mod classifier;
mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use classifier::{classify, request_line, starts_request, RequestLine, CACHEABLE_METHOD};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Cache store handle shared by every session.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing across sessions.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
