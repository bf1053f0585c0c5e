use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Relay service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Whether LAN access is allowed
    /// - false: loopback only 127.0.0.1 (default)
    /// - true: all interfaces 0.0.0.0
    pub allow_lan_access: bool,

    /// Listening port (0 picks a free port)
    pub port: u16,

    /// Path prefix that is stripped before forwarding, e.g. `/api`
    pub prefix: String,

    /// Upstream base URL the stripped path is appended to
    pub upstream_base_url: String,

    /// The single browser origin allowed to call the relay with credentials
    pub trusted_origin: String,

    /// Upstream request timeout (seconds)
    pub request_timeout: u64,

    /// Accept self-signed or otherwise invalid upstream certificates
    pub accept_invalid_certs: bool,

    /// Largest request body the relay will buffer
    pub max_body_bytes: usize,

    /// Outbound proxy for upstream traffic
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpstreamProxyConfig {
    /// Whether it is enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "http://108.60.201.12/WebApiLicitacionesCaasim";

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: 3001,
            prefix: "/api".to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            trusted_origin: "http://localhost:5173".to_string(),
            request_timeout: 120,
            accept_invalid_certs: false,
            max_body_bytes: 100 * 1024 * 1024,
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Preset matching the frontend dev server proxy: `/proxy-api` prefix and
    /// no upstream certificate verification.
    pub fn dev_server() -> Self {
        Self {
            prefix: "/proxy-api".to_string(),
            accept_invalid_certs: true,
            ..Self::default()
        }
    }

    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.prefix.starts_with('/') || self.prefix.ends_with('/') {
            return Err(AppError::Config(format!(
                "prefix must start with '/' and must not end with '/': {:?}",
                self.prefix
            )));
        }

        let upstream = url::Url::parse(&self.upstream_base_url).map_err(|e| {
            AppError::Config(format!(
                "invalid upstream_base_url {:?}: {}",
                self.upstream_base_url, e
            ))
        })?;
        if !matches!(upstream.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "upstream_base_url must be http or https: {}",
                self.upstream_base_url
            )));
        }

        axum::http::HeaderValue::from_str(&self.trusted_origin).map_err(|_| {
            AppError::Config(format!("invalid trusted_origin {:?}", self.trusted_origin))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.get_bind_address(), "127.0.0.1");

        let dev = RelayConfig::dev_server();
        assert_eq!(dev.prefix, "/proxy-api");
        assert!(dev.accept_invalid_certs);
        assert!(dev.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_prefix_and_upstream() {
        let mut config = RelayConfig::default();
        config.prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.prefix = "/api/".to_string();
        assert!(config.validate().is_err());

        config.prefix = "/api".to_string();
        config.upstream_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.upstream_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RelayConfig = serde_json::from_str(r#"{"port": 4000}"#).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.prefix, "/api");
        assert_eq!(config.upstream_base_url, DEFAULT_UPSTREAM_BASE_URL);
    }
}
