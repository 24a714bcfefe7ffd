//! Cache Entry Module
//!
//! Defines a cached request/response pairing with fill-time expiration.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A request target and the response body observed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Request method (only `GET` ever reaches the store)
    pub method: String,
    /// Request target, used as the cache key
    pub target: String,
    /// Protocol token from the request line, recorded but not validated
    pub protocol: String,
    /// Cached response bytes; empty means not yet filled
    pub body: Vec<u8>,
    /// Identifier correlating the request with the response that fills it
    pub id: u64,
    /// Set when the body is filled, None while pending
    pub created_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an unfilled entry skeleton.
    pub fn new(
        method: impl Into<String>,
        target: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            protocol: protocol.into(),
            body: Vec::new(),
            id: 0,
            created_at: None,
        }
    }

    /// Returns true once a response body has been attached.
    pub fn is_filled(&self) -> bool {
        !self.body.is_empty()
    }

    // == Is Expired ==
    /// Checks whether the entry is older than the expiration window.
    ///
    /// The entry is expired once strictly more than `window` has elapsed
    /// since it was filled. Pending entries never expire.
    pub fn is_expired(&self, window: Duration) -> bool {
        self.age().is_some_and(|age| age > window)
    }

    /// Time elapsed since the body was filled.
    pub fn age(&self) -> Option<Duration> {
        self.created_at.map(|filled| filled.elapsed())
    }

    // == Fill ==
    /// Attaches a response body if none is present yet.
    ///
    /// Returns false when the entry was already filled (first write wins)
    /// or when `body` is empty.
    pub fn fill(&mut self, body: &[u8]) -> bool {
        if self.is_filled() || body.is_empty() {
            return false;
        }
        self.body = body.to_vec();
        self.created_at = Some(Instant::now());
        true
    }

    /// Appends a later part of the response to an already filled body.
    ///
    /// Pending or cleared entries are left alone. The fill timestamp is kept.
    pub fn extend(&mut self, more: &[u8]) -> bool {
        if !self.is_filled() || more.is_empty() {
            return false;
        }
        self.body.extend_from_slice(more);
        true
    }

    /// Drops the cached body so the entry can be filled again.
    pub fn clear(&mut self) {
        self.body = Vec::new();
        self.created_at = None;
    }
}
