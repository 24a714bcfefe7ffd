//! Proxy Module
//!
//! Listener, per-connection sessions and the byte pumps between client and
//! upstream.

pub mod pump;
pub mod server;
pub mod session;

pub use pump::{pump_requests, pump_responses, ClientWriter, FillTag, DEFAULT_BUFFER_SIZE};
pub use server::{resolve_addr, ProxyServer};
pub use session::{Session, SessionGuard, SessionId, SessionState, SessionTracker};
