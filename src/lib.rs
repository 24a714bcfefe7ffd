//! Cache Proxy - a transparent TCP reverse proxy
//!
//! Forwards bytes between clients and one fixed upstream, answering repeated
//! GET requests from a short-lived in-memory cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use proxy::{ProxyServer, SessionTracker};
pub use tasks::spawn_expiry_task;
