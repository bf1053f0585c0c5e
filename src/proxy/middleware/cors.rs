// CORS layer for the single trusted browser origin

use axum::http::HeaderValue;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};

use crate::error::{AppError, AppResult};

/// Allow `trusted_origin` with credentials.
///
/// Credentials rule out wildcards, so methods and headers are mirrored from
/// the preflight request instead.
pub fn cors_layer(trusted_origin: &str) -> AppResult<CorsLayer> {
    let origin = HeaderValue::from_str(trusted_origin)
        .map_err(|_| AppError::Config(format!("invalid trusted_origin {:?}", trusted_origin)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(3600)))
}
