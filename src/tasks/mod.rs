//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the proxy is up.
//!
//! # Tasks
//! - Expiry sweep: clears cached bodies older than the expiration window

mod expiry;

pub use expiry::spawn_expiry_task;
