//! HTTP server for the dashboard REST API

use crate::api::handlers;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the router with all routes
pub fn router(state: Arc<AppState>) -> Router {
    // Dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/last-update", get(handlers::get_last_update))
        .route("/api/commentary", get(handlers::get_commentary))
        .route("/api/risk", get(handlers::get_risk_measures))
        .route("/api/risk/assessment", get(handlers::get_risk_assessment))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/:domain", get(handlers::get_snapshot))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Bind `addr` and serve in a background task. Returns the bound address.
    pub async fn start(&mut self, addr: &str) -> Result<SocketAddr> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address '{}': {}", addr, e)))?;

        let app = router(self.state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        });
        self.task = Some(task);

        info!("Dashboard API listening on http://{}", local_addr);
        Ok(local_addr)
    }

    /// Signal shutdown and wait for in-flight requests to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("API server task failed: {}", e);
            }
        }
    }

    /// Stop the server without waiting
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::in_memory_state;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(in_memory_state());
        let (status, body) = send(app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_snapshot_before_any_ingestion() {
        let app = router(in_memory_state());
        let (status, body) = send(app, "GET", "/api/markets").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], Value::Array(vec![]));
        assert_eq!(body["lastUpdate"], Value::Null);
    }

    #[tokio::test]
    async fn test_refresh_then_filtered_snapshot() {
        let state = in_memory_state();

        let (status, refresh) = send(router(state.clone()), "POST", "/api/refresh").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(refresh["success"], true);
        assert!(refresh["lastUpdate"].is_string());

        let (status, body) = send(router(state.clone()), "GET", "/api/markets?category=fx").await;
        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(|row| row["category"] == "fx"));
        assert_eq!(body["lastUpdate"], refresh["lastUpdate"]);

        let (_, last) = send(router(state), "GET", "/api/last-update").await;
        assert_eq!(last["lastUpdate"], refresh["lastUpdate"]);
    }

    #[tokio::test]
    async fn test_portfolio_alias_and_null_fields() {
        let state = in_memory_state();
        send(router(state.clone()), "POST", "/api/refresh").await;

        let (status, body) = send(router(state), "GET", "/api/portfolio?id=POS-003").await;
        assert_eq!(status, StatusCode::OK);
        let row = &body["data"][0];
        assert_eq!(row["bucket"], "Illiquid – Private Equity");
        assert_eq!(row["ytd_value"], Value::Null);
    }

    #[tokio::test]
    async fn test_errors_map_to_status_codes() {
        let state = in_memory_state();

        let (status, body) = send(router(state.clone()), "GET", "/api/crypto").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) =
            send(router(state.clone()), "GET", "/api/markets?colour=red").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(router(state), "GET", "/api/risk?asOfDate=tomorrow").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_risk_routes() {
        let state = in_memory_state();

        let (_, assessment) = send(router(state.clone()), "GET", "/api/risk/assessment").await;
        assert_eq!(assessment["status"], "insufficient_data");

        send(router(state.clone()), "POST", "/api/refresh").await;

        let (status, body) = send(router(state.clone()), "GET", "/api/risk").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["asOfDate"].is_string());
        assert!(!body["data"].as_array().unwrap().is_empty());

        let (_, assessment) = send(router(state), "GET", "/api/risk/assessment").await;
        assert_eq!(assessment["status"], "computed");
    }

    #[tokio::test]
    async fn test_commentary_route() {
        let state = in_memory_state();
        let (_, body) = send(router(state.clone()), "GET", "/api/commentary").await;
        assert_eq!(body["summary"], "No market data available...");

        send(router(state.clone()), "POST", "/api/refresh").await;
        let (_, body) = send(router(state), "GET", "/api/commentary").await;
        assert_eq!(body["changes"].as_array().unwrap().len(), 5);
        assert!(body["lastUpdate"].is_string());
    }

    #[tokio::test]
    async fn test_server_binds_and_stops() {
        let mut server = ApiServer::new(in_memory_state());
        let addr = server.start("127.0.0.1:0").await.unwrap();
        assert!(server.is_running());
        assert_ne!(addr.port(), 0);
        server.shutdown().await;
    }
}
