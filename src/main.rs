#[tokio::main]
async fn main() {
    if let Err(e) = pedido_bridge_lib::run().await {
        eprintln!("pedido-bridge: {}", e);
        std::process::exit(1);
    }
}
