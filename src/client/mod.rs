// Procurement API client: token cache plus the pedido listing

pub mod api;
pub mod config;
pub mod token_manager;

pub use api::{ApiClient, DEFAULT_MAXIMUM_ROWS, DEFAULT_START_ROW_INDEX};
pub use config::ClientConfig;
pub use token_manager::{CachedToken, Clock, SystemClock, TokenManager};
