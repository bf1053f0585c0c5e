pub mod config;
pub mod pedido;

pub use config::AppConfig;
pub use pedido::{Pedido, PedidosResponse, Proveedor, SpartanUser};
