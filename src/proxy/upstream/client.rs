// Upstream client: forwards relayed requests to the procurement API

use axum::http::{header, HeaderMap, HeaderName, Method};
use bytes::Bytes;
use reqwest::{Client, Response};

use crate::error::AppResult;
use crate::proxy::config::RelayConfig;
use crate::utils::http::{create_client_with_proxy, HttpClientOptions};

/// Connection-scoped headers that must not cross the relay
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    prefix: String,
}

impl UpstreamClient {
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        let http_client = create_client_with_proxy(&HttpClientOptions {
            timeout_secs: Some(config.request_timeout),
            proxy: Some(config.upstream_proxy.clone()),
            accept_invalid_certs: config.accept_invalid_certs,
            follow_redirects: false,
        })?;

        Ok(Self {
            http_client,
            base_url: config.upstream_base_url.clone(),
            prefix: config.prefix.clone(),
        })
    }

    /// Upstream URL for a relay path, or None when the path is outside the prefix
    pub fn build_url(&self, path: &str, query: Option<&str>) -> Option<String> {
        rewrite_target(&self.prefix, &self.base_url, path, query)
    }

    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self.http_client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        request.send().await
    }
}

/// Strip `prefix` from `path` and append the remainder to `base`.
///
/// The prefix only matches on a segment boundary: `/api` matches `/api` and
/// `/api/x` but not `/apix`. The query string is carried over untouched.
pub fn rewrite_target(
    prefix: &str,
    base: &str,
    path: &str,
    query: Option<&str>,
) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let rest = if rest.is_empty() { "/" } else { rest };

    let mut target = format!("{}{}", base.trim_end_matches('/'), rest);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    Some(target)
}

/// Headers sent upstream: everything except hop-by-hop, `Host` (the client
/// sets it from the upstream URL), `Origin`, and `Content-Length`.
pub fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = headers.clone();
    for name in HOP_BY_HOP.iter() {
        filtered.remove(name);
    }
    filtered.remove(header::HOST);
    filtered.remove(header::ORIGIN);
    filtered.remove(header::CONTENT_LENGTH);
    filtered
}

/// Headers sent back to the browser: upstream CORS headers are dropped so the
/// relay's own CORS layer is the only source.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if HOP_BY_HOP.contains(name) || name.as_str().starts_with("access-control-") {
            continue;
        }
        filtered.append(name.clone(), value.clone());
    }
    filtered
}
