use serde::{Deserialize, Serialize};

use crate::modules::oauth::{default_strategies, AuthStrategy};
use crate::proxy::config::UpstreamProxyConfig;

/// API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the relay (not the upstream), e.g. `http://localhost:3001/api`
    pub base_url: String,

    pub token_path: String,

    pub pedidos_path: String,

    /// Seconds taken off the server-declared token lifetime
    pub expiry_margin_secs: i64,

    /// Request timeout (seconds); None leaves the transport default
    pub request_timeout: Option<u64>,

    /// Token request shapes, tried in order
    pub auth_strategies: Vec<AuthStrategy>,

    pub upstream_proxy: UpstreamProxyConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            token_path: "/oauth/token".to_string(),
            pedidos_path: "/api/pedido/ListaSelAll".to_string(),
            expiry_margin_secs: 30,
            request_timeout: None,
            auth_strategies: default_strategies(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn token_url(&self) -> String {
        join_url(&self.base_url, &self.token_path)
    }

    pub fn pedidos_url(&self) -> String {
        join_url(&self.base_url, &self.pedidos_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
