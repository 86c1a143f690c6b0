//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::{ServerDeps, SessionRegistry};
use crate::server::routes::{health_handler, ws_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub server_deps: Arc<ServerDeps>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(server_deps: ServerDeps) -> Self {
        Self {
            server_deps: Arc::new(server_deps),
            sessions: SessionRegistry::new(),
        }
    }
}

/// CORS layer: the listed origins, or any origin when the list is empty.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Build the Axum application router
///
/// - `GET /ws`: WebSocket endpoint for text ingestion
/// - `GET /health`: store connectivity and session count
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
