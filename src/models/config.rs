use crate::client::ClientConfig;
use crate::proxy::RelayConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
