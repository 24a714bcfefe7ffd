//! Request Classifier
//!
//! Looks at the first line of a chunk read from a client and decides whether
//! it is a cacheable request. This is a heuristic, not an HTTP parser: the
//! request line must arrive whole at the start of a single read.

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// The only method whose responses are cached.
pub const CACHEABLE_METHOD: &str = "GET";

/// Borrowed `METHOD TARGET PROTOCOL` tokens from a chunk's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub target: &'a str,
    pub protocol: &'a str,
}

/// Splits the chunk's first line into its three whitespace-separated tokens.
///
/// Returns None when the line is not valid UTF-8 or has fewer than three
/// tokens. Extra tokens are ignored.
pub fn request_line(chunk: &[u8]) -> Option<RequestLine<'_>> {
    let line_end = chunk
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(chunk.len());
    let line = std::str::from_utf8(&chunk[..line_end]).ok()?;

    let mut tokens = line.split_whitespace();
    Some(RequestLine {
        method: tokens.next()?,
        target: tokens.next()?,
        protocol: tokens.next()?,
    })
}

/// True when the chunk opens with something shaped like an HTTP request line.
///
/// Used to tell a fresh non-cacheable request apart from bytes continuing an
/// earlier one (a request body, for instance).
pub fn starts_request(chunk: &[u8]) -> bool {
    request_line(chunk).is_some_and(|line| line.protocol.starts_with("HTTP/"))
}

// == Classify ==
/// Builds an unfilled cache entry from a cacheable request chunk.
///
/// Fails with `CacheError::NotCacheable` for any method other than `GET`
/// and for chunks without a usable first line.
pub fn classify(chunk: &[u8]) -> Result<CacheEntry> {
    let line = request_line(chunk)
        .ok_or_else(|| CacheError::NotCacheable("malformed request line".to_string()))?;

    if line.method != CACHEABLE_METHOD {
        return Err(CacheError::NotCacheable(format!(
            "Caching only available for {} method, got {}",
            CACHEABLE_METHOD, line.method
        )));
    }

    Ok(CacheEntry::new(line.method, line.target, line.protocol))
}
