// Forwarding handler: everything under the prefix goes upstream as-is

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::proxy::server::RelayState;
use crate::proxy::upstream::client::{filter_request_headers, filter_response_headers};

pub async fn handle_forward(State(state): State<RelayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let uri = parts.uri;

    let Some(target) = state.upstream.build_url(uri.path(), uri.query()) else {
        tracing::debug!("No relay route for {} {}", parts.method, uri);
        return error_response(StatusCode::NOT_FOUND, "No relay route for this path");
    };

    let body = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Rejected request body for {}: {}", uri, e);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large or unreadable",
            );
        }
    };

    tracing::info!("Proxy request: {} {} -> {}", parts.method, uri, target);

    let headers = filter_request_headers(&parts.headers);
    match state
        .upstream
        .forward(parts.method, &target, headers, body)
        .await
    {
        Ok(upstream) => {
            tracing::info!("Proxy response: {} for {}", upstream.status(), uri);
            relay_response(upstream)
        }
        Err(e) => {
            tracing::error!("Proxy error for {} -> {}: {}", uri, target, e);
            error_response(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}

/// Copy status, headers and the streamed body of the upstream response
fn relay_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = filter_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
