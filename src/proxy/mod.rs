// proxy module - local CORS relay in front of the procurement API

pub mod config;
pub mod handlers; // Relay endpoint handlers
pub mod middleware; // CORS
pub mod server;
pub mod upstream; // Upstream client

pub use config::{RelayConfig, UpstreamProxyConfig};
pub use server::RelayServer;
