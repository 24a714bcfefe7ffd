//! API Routes
//!
//! Configures the Axum router for the admin endpoints.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{entries_handler, health_handler, lookup_handler, stats_handler, AppState};

/// Creates the admin router.
///
/// All endpoints are read-only. Requests are traced through tower-http.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/entries", get(entries_handler))
        .route("/entries/lookup", get(lookup_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
