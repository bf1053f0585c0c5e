use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Token endpoint response. Only these three fields are relied upon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// One request shape accepted (maybe) by the token endpoint.
///
/// The upstream never documented which shape it wants, so the client tries a
/// list of these in order and keeps the first one that gets a 2xx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthStrategy {
    /// POST with a JSON content type and no body
    NoBody,
    /// `grant_type=client_credentials`, form-encoded
    ClientCredentials,
    /// `grant_type=password` with the given credentials, form-encoded
    Password {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
}

/// Result of a single probe that reached the server.
#[derive(Debug)]
pub enum ProbeOutcome {
    Accepted(TokenResponse),
    Rejected { status: StatusCode, body: String },
}

/// The probe order used when nothing else is configured.
pub fn default_strategies() -> Vec<AuthStrategy> {
    vec![
        AuthStrategy::NoBody,
        AuthStrategy::ClientCredentials,
        AuthStrategy::Password {
            username: String::new(),
            password: String::new(),
        },
    ]
}

impl AuthStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AuthStrategy::NoBody => "no body",
            AuthStrategy::ClientCredentials => "client_credentials",
            AuthStrategy::Password { .. } => "password",
        }
    }

    fn build(&self, client: &Client, url: &str) -> RequestBuilder {
        let builder = client
            .post(url)
            .header(header::ACCEPT, "application/json");

        match self {
            AuthStrategy::NoBody => builder.header(header::CONTENT_TYPE, "application/json"),
            AuthStrategy::ClientCredentials => builder.form(&[("grant_type", "client_credentials")]),
            AuthStrategy::Password { username, password } => builder.form(&[
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ]),
        }
    }

    /// Send this shape to the token endpoint.
    ///
    /// An HTTP rejection is a normal `Rejected` outcome so the caller can move
    /// on to the next shape. Transport failures and a 2xx body that is not a
    /// token are errors.
    pub async fn probe(&self, client: &Client, url: &str) -> AppResult<ProbeOutcome> {
        let response = self.build(client, url).send().await?;
        let status = response.status();
        tracing::debug!("Auth probe ({}) status: {}", self.label(), status);
        tracing::debug!("Auth probe ({}) headers: {:?}", self.label(), response.headers());

        let body = response.text().await?;
        if status.is_success() {
            Ok(ProbeOutcome::Accepted(serde_json::from_str(&body)?))
        } else {
            Ok(ProbeOutcome::Rejected { status, body })
        }
    }
}

/// Run the probes in order and return the first accepted token.
pub async fn request_token(
    client: &Client,
    url: &str,
    strategies: &[AuthStrategy],
) -> AppResult<TokenResponse> {
    tracing::info!("Requesting new access token from {}", url);

    let mut last_rejection: Option<(StatusCode, String)> = None;
    for strategy in strategies {
        tracing::info!("Trying authentication with {}...", strategy.label());
        match strategy.probe(client, url).await? {
            ProbeOutcome::Accepted(token) => {
                tracing::info!(
                    "Token obtained with {} (type: {}, expires in {}s)",
                    strategy.label(),
                    token.token_type,
                    token.expires_in
                );
                return Ok(token);
            }
            ProbeOutcome::Rejected { status, body } => {
                tracing::warn!("Authentication with {} rejected: {}", strategy.label(), status);
                last_rejection = Some((status, body));
            }
        }
    }

    let Some((status, body)) = last_rejection else {
        return Err(AppError::Config("no auth strategies configured".to_string()));
    };
    tracing::error!("All authentication attempts failed, last response: {} {}", status, body);
    Err(AppError::Authentication { status, body })
}
