use crate::error::{AppError, AppResult};
use crate::proxy::config::RelayConfig;
use crate::proxy::upstream::UpstreamClient;
use axum::{
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state
#[derive(Clone)]
pub struct RelayState {
    pub upstream: Arc<UpstreamClient>,
    pub max_body_bytes: usize,
}

/// Build the relay router: health check plus the forwarding fallback
pub fn build_router(config: &RelayConfig) -> AppResult<Router> {
    let state = RelayState {
        upstream: Arc::new(UpstreamClient::new(config)?),
        max_body_bytes: config.max_body_bytes,
    };

    use crate::proxy::handlers;
    let app = Router::new()
        .route("/healthz", get(health_check_handler))
        .fallback(handlers::forward::handle_forward)
        .layer(TraceLayer::new_for_http())
        .layer(crate::proxy::middleware::cors_layer(&config.trusted_origin)?)
        .with_state(state);

    Ok(app)
}

/// Running relay instance
pub struct RelayServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

impl RelayServer {
    /// Start the relay
    pub async fn start(config: RelayConfig) -> AppResult<(Self, tokio::task::JoinHandle<()>)> {
        config.validate()?;
        let app = build_router(&config)?;

        // Bind address
        let addr = format!("{}:{}", config.get_bind_address(), config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Server(format!("Failed to bind address {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Relay server started at http://{}", local_addr);
        tracing::info!(
            "Redirecting {}/* to {}/*",
            config.prefix,
            config.upstream_base_url.trim_end_matches('/')
        );

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Relay server stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL of the relayed prefix, e.g. `http://127.0.0.1:3001/api`
    pub fn base_url(&self, prefix: &str) -> String {
        format!("http://{}{}", self.local_addr, prefix)
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
