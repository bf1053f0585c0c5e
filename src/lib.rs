pub mod client;
pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Relay service module
mod utils;

use modules::logger;
use tracing::{error, info};

pub use client::{ApiClient, ClientConfig};
pub use error::{AppError, AppResult};
pub use models::{Pedido, PedidosResponse};
pub use proxy::{RelayConfig, RelayServer};

/// Run the relay until Ctrl-C
pub async fn run() -> AppResult<()> {
    // Initialize logger
    logger::init_logger();

    let config = modules::config::load_app_config()?;
    let (server, handle) = RelayServer::start(config.relay.clone()).await?;
    info!(
        "Relay serving {} for origin {}",
        server.base_url(&config.relay.prefix),
        config.relay.trusted_origin
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down relay...");
    server.stop();
    handle.await.ok();
    Ok(())
}
