use reqwest::{redirect, Client, Proxy};

use crate::error::{AppError, AppResult};
use crate::proxy::config::UpstreamProxyConfig;

/// Options shared by the relay's upstream client and the API client
#[derive(Debug, Clone, Default)]
pub struct HttpClientOptions {
    /// None keeps reqwest's default (no timeout)
    pub timeout_secs: Option<u64>,
    pub proxy: Option<UpstreamProxyConfig>,
    pub accept_invalid_certs: bool,
    /// The relay must hand 3xx responses back to the browser untouched
    pub follow_redirects: bool,
}

/// Create an HTTP client with the given options.
///
/// An invalid outbound proxy address is logged and ignored.
pub fn create_client_with_proxy(options: &HttpClientOptions) -> AppResult<Client> {
    let mut builder = Client::builder();

    if let Some(timeout) = options.timeout_secs {
        builder = builder.timeout(std::time::Duration::from_secs(timeout));
    }

    if let Some(config) = &options.proxy {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    if options.accept_invalid_certs {
        tracing::warn!("Upstream certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if !options.follow_redirects {
        builder = builder.redirect(redirect::Policy::none());
    }

    builder
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_is_ignored() {
        let options = HttpClientOptions {
            timeout_secs: Some(5),
            proxy: Some(UpstreamProxyConfig {
                enabled: true,
                url: "::not a proxy::".to_string(),
            }),
            ..Default::default()
        };
        assert!(create_client_with_proxy(&options).is_ok());
    }
}
