//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::cache::SharedCache;
use crate::error::Result;
use crate::models::{EntryResponse, HealthResponse, StatsResponse};
use crate::proxy::SessionTracker;

/// Application state shared across all handlers.
///
/// Holds the same cache handle and session tracker the proxy uses.
#[derive(Clone)]
pub struct AppState {
    /// Shared response cache
    pub cache: SharedCache,
    /// Live session counters
    pub sessions: SessionTracker,
}

impl AppState {
    /// Creates a new AppState around an existing cache handle.
    pub fn new(cache: SharedCache, sessions: SessionTracker) -> Self {
        Self { cache, sessions }
    }
}

/// Query string for GET /entries/lookup
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// Exact request target, e.g. `/widget`
    pub target: String,
}

/// Handler for GET /stats
///
/// Returns cache statistics and session counts.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();

    Json(StatsResponse::new(
        &stats,
        state.sessions.active_count(),
        state.sessions.total_count(),
    ))
}

/// Handler for GET /entries
///
/// Lists every entry in target order.
pub async fn entries_handler(State(state): State<AppState>) -> Json<Vec<EntryResponse>> {
    let cache = state.cache.read().await;
    Json(cache.entries().iter().map(EntryResponse::from).collect())
}

/// Handler for GET /entries/lookup?target=...
///
/// Returns the entry for one target, or 404 when none exists.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<EntryResponse>> {
    let entry = state.cache.read().await.find_by_target(&query.target)?;
    Ok(Json(EntryResponse::from(&entry)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
