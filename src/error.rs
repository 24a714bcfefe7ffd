//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Outcomes of classification and cache lookups.
///
/// None of these are faults: callers treat them as "forward without caching"
/// or "no cache hit".
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The chunk does not start with a cacheable request line
    #[error("Not cacheable: {0}")]
    NotCacheable(String),

    /// Index lookup against an empty or shorter store
    #[error("Index out of range: {0}")]
    IndexOutOfRange(usize),

    /// No entry matches the requested target or identifier
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotCacheable(_) => StatusCode::BAD_REQUEST,
            CacheError::IndexOutOfRange(_) | CacheError::EntryNotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Proxy Error Enum ==
/// Setup and streaming failures.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Address string could not be resolved to a socket address
    #[error("Failed to resolve address {addr}: {source}")]
    AddressResolution {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Local listener could not be bound
    #[error("Failed to open local port {addr} to listen: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Accepting a client connection failed
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// Upstream connection could not be opened
    #[error("Remote connection to {addr} failed: {source}")]
    Dial {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Read or write failure while pumping bytes
    #[error("Stream error: {0}")]
    Stream(#[from] io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
