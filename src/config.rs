//! Configuration Module
//!
//! Command-line flags for the proxy. Every flag can also be supplied through
//! an environment variable, and every value has a sensible default.

use std::time::Duration;

use clap::Parser;

use crate::proxy::DEFAULT_BUFFER_SIZE;

/// Default local bind address (all interfaces, port 8080)
pub const DEFAULT_LOCAL_ADDR: &str = ":8080";

/// Default upstream service address
pub const DEFAULT_REMOTE_ADDR: &str = "localhost:3000";

/// Default cache expiration window in seconds
pub const DEFAULT_CACHE_EXPIRATION: u64 = 4;

/// Smallest accepted pump buffer in bytes
pub const MIN_BUFFER_SIZE: usize = 1024;

/// Largest accepted pump buffer in bytes
pub const MAX_BUFFER_SIZE: usize = 6 * 1024;

/// Proxy configuration parameters.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cache_proxy",
    version,
    about = "Transparent TCP reverse proxy with a short-lived GET response cache"
)]
pub struct Config {
    /// Local address to accept client connections on
    #[arg(short = 'l', long = "local", env = "PROXY_LOCAL_ADDR", default_value = DEFAULT_LOCAL_ADDR)]
    pub local_addr: String,

    /// Upstream address every session is forwarded to
    #[arg(short = 'r', long = "remote", env = "PROXY_REMOTE_ADDR", default_value = DEFAULT_REMOTE_ADDR)]
    pub remote_addr: String,

    /// Cache expiration window in seconds
    #[arg(short = 'c', long, env = "PROXY_CACHE_EXPIRATION", default_value_t = DEFAULT_CACHE_EXPIRATION)]
    pub cache_expiration: u64,

    /// Size of the per-direction read buffer in bytes
    #[arg(long, env = "PROXY_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE, value_parser = parse_buffer_size)]
    pub buffer_size: usize,

    /// Interval in seconds between expiry sweeps (0 disables the sweep)
    #[arg(long, env = "PROXY_SWEEP_INTERVAL", default_value_t = 1)]
    pub sweep_interval: u64,

    /// Address for the HTTP admin API; disabled when unset
    #[arg(long = "admin", env = "PROXY_ADMIN_ADDR")]
    pub admin_addr: Option<String>,
}

impl Config {
    /// Returns the cache expiration window as a Duration.
    pub fn cache_expiration(&self) -> Duration {
        Duration::from_secs(self.cache_expiration)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            local_addr: DEFAULT_LOCAL_ADDR.to_string(),
            remote_addr: DEFAULT_REMOTE_ADDR.to_string(),
            cache_expiration: DEFAULT_CACHE_EXPIRATION,
            buffer_size: DEFAULT_BUFFER_SIZE,
            sweep_interval: 1,
            admin_addr: None,
        }
    }
}

fn parse_buffer_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|_| format!("`{}` is not a valid byte count", value))?;

    if (MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(format!(
            "buffer size must be between {} and {} bytes",
            MIN_BUFFER_SIZE, MAX_BUFFER_SIZE
        ))
    }
}
