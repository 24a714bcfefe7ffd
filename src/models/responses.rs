//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheEntry, CacheStats};

/// Summary of one cache entry (GET /entries, GET /entries/lookup)
///
/// Bodies are not echoed back, only their length.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub id: u64,
    pub method: String,
    pub target: String,
    pub protocol: String,
    /// Length of the cached body in bytes
    pub body_len: usize,
    /// Whether a response body is attached
    pub filled: bool,
    /// Milliseconds since the body was filled
    pub age_ms: Option<u64>,
}

impl From<&CacheEntry> for EntryResponse {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            id: entry.id,
            method: entry.method.clone(),
            target: entry.target.clone(),
            protocol: entry.protocol.clone(),
            body_len: entry.body.len(),
            filled: entry.is_filled(),
            age_ms: entry.age().map(|age| age.as_millis() as u64),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests answered from the cache
    pub hits: u64,
    /// Cacheable requests forwarded upstream
    pub misses: u64,
    /// Entries filled from upstream responses
    pub fills: u64,
    /// Bodies cleared after expiring
    pub expirations: u64,
    /// Entries currently in the store
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Sessions currently open
    pub active_sessions: u64,
    /// Sessions accepted since startup
    pub total_sessions: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics and session counts
    pub fn new(stats: &CacheStats, active_sessions: u64, total_sessions: u64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fills: stats.fills,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            active_sessions,
            total_sessions,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
