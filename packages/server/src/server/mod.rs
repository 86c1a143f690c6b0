// HTTP server setup (Axum + WebSocket sessions)
pub mod app;
pub mod routes;
pub mod session;

pub use app::*;
pub use session::Session;
