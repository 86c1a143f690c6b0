use axum::{extract::Extension, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: String, // 'connected' | 'disconnected'
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_error: Option<String>,
    pub websocket: String,
    pub active_sessions: usize,
    pub version: String,
}

/// Health check endpoint
///
/// Checks:
/// - Company store connectivity (5s timeout)
/// - Number of live WebSocket sessions
///
/// Returns 200 OK if the store is reachable, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database_error = match tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state.server_deps.store.ping(),
    )
    .await
    {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database connection failed");
            Some(e.to_string())
        }
        Err(_) => Some("Query timeout (>5s)".to_string()),
    };

    let is_healthy = database_error.is_none();
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: Utc::now(),
            database: if is_healthy { "connected" } else { "disconnected" }.to_string(),
            database_error,
            websocket: "enabled".to_string(),
            active_sessions: state.sessions.len().await,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::companies::models::CompanyCandidate;
    use crate::kernel::{InMemoryCompanyStore, MockCompanyExtractor, TestDependencies};

    #[tokio::test]
    async fn test_healthy_store() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let state = AppState::new(deps.server_deps());
        let (_handle, _rx) = state.sessions.register().await;

        let (status, Json(body)) = health_handler(Extension(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.database, "connected");
        assert_eq!(body.websocket, "enabled");
        assert_eq!(body.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let deps = TestDependencies::new(
            MockCompanyExtractor::new(),
            InMemoryCompanyStore::new().failing("connection refused"),
        );
        let state = AppState::new(deps.server_deps());

        let (status, Json(body)) = health_handler(Extension(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.database, "disconnected");
        assert_eq!(
            body.database_error.as_deref(),
            Some("store unavailable: connection refused")
        );
    }
}
