//! Read-only admin endpoints, served on their own listener.
//!
//! - `GET /health`: process liveness
//! - `GET /status`: backend pool snapshot
//! - `GET /config`: resolved configuration
//! - `GET /metrics`: aggregate traffic, latency and error counters

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::config::ProxyConfig;
use crate::load_balancer::BackendPool;
use crate::observability::metrics::ProxyMetrics;

/// Shared state for admin handlers.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub pool: Arc<BackendPool>,
    pub metrics: Arc<ProxyMetrics>,
    pub config: Arc<ProxyConfig>,
    pub started: Instant,
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/status", get(get_status))
        .route("/config", get(get_config))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::load_balancer::test_support::pool_of;

    fn state(pool: Arc<BackendPool>) -> AdminState {
        AdminState {
            pool,
            metrics: Arc::new(ProxyMetrics::new()),
            config: Arc::new(ProxyConfig::default()),
            started: Instant::now(),
        }
    }

    async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(router(state(pool_of(&[("a", 1)]))), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "proxymity");
    }

    #[tokio::test]
    async fn test_status_degraded_and_unhealthy() {
        let pool = pool_of(&[("a", 1), ("b", 1)]);
        pool.get("b").unwrap().set_healthy(false);

        let (status, body) = get_json(router(state(pool.clone())), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["backends"]["total"], 2);
        assert_eq!(body["backends"]["healthy"], 1);
        assert_eq!(body["backends"]["details"][1]["healthy"], false);

        pool.get("a").unwrap().set_healthy(false);
        let (status, body) = get_json(router(state(pool)), "/status").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_config_and_metrics() {
        let admin = state(pool_of(&[("a", 1)]));
        admin.metrics.record_attempt("a", 10);
        admin.metrics.record_retry();

        let (status, body) = get_json(router(admin.clone()), "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["listener"]["bind_address"], "0.0.0.0:8080");

        let (status, body) = get_json(router(admin), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["traffic"]["requests"], 1);
        assert_eq!(body["traffic"]["bytes_in"], 10);
        assert_eq!(body["errors"]["retries"], 1);
    }
}
