//! HTTP server for ingester health and per-family pass status.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::scheduler::{FamilyStatus, StatusBoard};

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub families: Vec<FamilyStatus>,
}

pub struct ServerState {
    pub status: Arc<StatusBoard>,
    pub started_at: DateTime<Utc>,
}

/// Create the status API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(Extension(state))
}

/// GET /status - Last pass of every family
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    Json(StatusResponse {
        service: "radar-ingester".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        families: state.status.snapshot().await,
    })
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "radar-ingester",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> Arc<ServerState> {
        Arc::new(ServerState {
            status: Arc::new(StatusBoard::default()),
            started_at: Utc::now(),
        })
    }

    async fn get_json(uri: &str) -> serde_json::Value {
        let response = create_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let body = get_json("/health").await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "radar-ingester");
    }

    #[tokio::test]
    async fn test_status_lists_families() {
        let body = get_json("/status").await;
        assert_eq!(body["service"], "radar-ingester");
        assert!(body["families"].as_array().unwrap().is_empty());
    }
}
