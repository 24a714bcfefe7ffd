//! API Module
//!
//! HTTP admin API exposing the proxy's cache and session state.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics and session counts
//! - `GET /entries` - Every cache entry, in target order
//! - `GET /entries/lookup?target=/x` - The entry for one target

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
