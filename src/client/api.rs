use chrono::Duration;
use reqwest::{header, Client, Response, StatusCode};
use std::sync::Arc;

use crate::client::config::ClientConfig;
use crate::client::token_manager::{CachedToken, Clock, SystemClock, TokenManager};
use crate::error::{AppError, AppResult};
use crate::models::PedidosResponse;
use crate::modules::oauth;
use crate::utils::http::{create_client_with_proxy, HttpClientOptions};

pub const DEFAULT_START_ROW_INDEX: u32 = 1;
pub const DEFAULT_MAXIMUM_ROWS: u32 = 10;

/// Client for the procurement API, normally pointed at the local relay.
///
/// Holds the bearer token for its own lifetime. Listing calls that come back
/// 401 drop the token, authenticate again and retry exactly once.
pub struct ApiClient {
    http_client: Client,
    config: ClientConfig,
    tokens: TokenManager,
    clock: Arc<dyn Clock>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let http_client = create_client_with_proxy(&HttpClientOptions {
            timeout_secs: config.request_timeout,
            proxy: Some(config.upstream_proxy.clone()),
            accept_invalid_certs: false,
            follow_redirects: true,
        })?;
        let margin = Duration::try_seconds(config.expiry_margin_secs).ok_or_else(|| {
            AppError::Config(format!(
                "expiry_margin_secs out of range: {}",
                config.expiry_margin_secs
            ))
        })?;

        Ok(Self {
            http_client,
            tokens: TokenManager::new(margin),
            config,
            clock,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Return the cached token, or authenticate if it is absent or past its margin.
    pub async fn get_access_token(&self) -> AppResult<String> {
        let url = self.config.token_url();
        self.tokens
            .get_or_refresh(self.clock.as_ref(), || {
                oauth::request_token(&self.http_client, &url, &self.config.auth_strategies)
            })
            .await
    }

    /// Drop the cached token (logout, or after the server rejected it)
    pub async fn clear_token(&self) {
        self.tokens.clear().await;
    }

    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.tokens.snapshot().await
    }

    /// Fetch one page of pedidos. Paging is driven by the caller.
    pub async fn get_pedidos(
        &self,
        start_row_index: u32,
        maximum_rows: u32,
    ) -> AppResult<PedidosResponse> {
        tracing::info!(
            start_row_index,
            maximum_rows,
            "Fetching pedidos from {}",
            self.config.pedidos_url()
        );

        let token = self.get_access_token().await?;
        let response = self
            .send_listing(&token, start_row_index, maximum_rows)
            .await?;
        let status = response.status();
        tracing::info!("Pedidos response status: {}", status);

        if status.is_success() {
            return Self::read_page(response).await;
        }

        let body = response.text().await?;
        if status != StatusCode::UNAUTHORIZED {
            tracing::error!("Pedidos request failed: {} {}", status, body);
            return Err(AppError::Request {
                status,
                body,
                retried: false,
            });
        }

        tracing::warn!("Token rejected by the server, clearing it and retrying once");
        self.clear_token().await;
        let token = self.get_access_token().await?;

        let response = self
            .send_listing(&token, start_row_index, maximum_rows)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Pedidos retry failed: {} {}", status, body);
            return Err(AppError::Request {
                status,
                body,
                retried: true,
            });
        }

        Self::read_page(response).await
    }

    async fn send_listing(
        &self,
        token: &str,
        start_row_index: u32,
        maximum_rows: u32,
    ) -> AppResult<Response> {
        let response = self
            .http_client
            .get(self.config.pedidos_url())
            .query(&[
                ("startRowIndex", start_row_index),
                ("maximumRows", maximum_rows),
            ])
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        Ok(response)
    }

    async fn read_page(response: Response) -> AppResult<PedidosResponse> {
        let body = response.text().await?;
        let page: PedidosResponse = serde_json::from_str(&body)?;
        tracing::info!("Fetched {} pedidos ({} rows total)", page.len(), page.row_count);
        Ok(page)
    }
}
