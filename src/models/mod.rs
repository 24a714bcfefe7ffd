//! Response models for the admin API
//!
//! DTOs serialized into admin HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{EntryResponse, ErrorResponse, HealthResponse, StatsResponse};
