//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Start the health checker and the admin listener
//! - Serve until shutdown, then drain within the grace period

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::time;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{self, AdminState};
use crate::config::ProxyConfig;
use crate::health::HealthChecker;
use crate::http::client::build_client;
use crate::http::dispatcher::ProxyDispatcher;
use crate::http::request::MakeRequestUuid;
use crate::load_balancer::{self, BackendPool, LoadBalancer};
use crate::observability::metrics::ProxyMetrics;

/// Application state injected into the proxy handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Arc<ProxyDispatcher>,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    pool: Arc<BackendPool>,
    dispatcher: Arc<ProxyDispatcher>,
    started: Instant,
}

impl HttpServer {
    /// Create a new HTTP server from a defaulted, validated configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let pool = Arc::new(BackendPool::from_config(&config.backends));
        let balancer = load_balancer::resolve(config.method(), pool.clone());
        let metrics = Arc::new(ProxyMetrics::new());

        let client = build_client(Duration::from_millis(config.timeouts.connect_ms));
        let dispatcher = Arc::new(ProxyDispatcher::new(
            balancer,
            client,
            metrics,
            Duration::from_millis(config.timeouts.request_ms),
        ));

        let router = Self::build_router(AppState {
            dispatcher: dispatcher.clone(),
        });

        Self {
            router,
            config: Arc::new(config),
            pool,
            dispatcher,
            started: Instant::now(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Router for the admin endpoints, sharing this server's pool and metrics.
    pub fn admin_router(&self) -> Router {
        admin::router(AdminState {
            pool: self.pool.clone(),
            metrics: self.dispatcher.metrics().clone(),
            config: self.config.clone(),
            started: self.started,
        })
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    ///
    /// After the signal no new connections are accepted; in-flight requests
    /// get `lifecycle.grace_period_secs` to finish before the server returns.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            method = %self.dispatcher.balancer().method(),
            backends = self.pool.len(),
            "HTTP server starting"
        );

        let health = HealthChecker::from_config(self.pool.clone(), &self.config.health_check).spawn();

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_addr = admin_listener.local_addr()?;
            let admin_app = self.admin_router();
            let mut admin_shutdown = shutdown.resubscribe();

            tokio::spawn(async move {
                tracing::info!(address = %admin_addr, "Admin server starting");
                let result = axum::serve(admin_listener, admin_app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin server failed");
                }
            });
        }

        let grace = Duration::from_secs(self.config.lifecycle.grace_period_secs);
        let (draining_tx, draining_rx) = oneshot::channel::<()>();

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
                let _ = draining_tx.send(());
            })
            .into_future();

        let deadline = async move {
            match draining_rx.await {
                Ok(()) => time::sleep(grace).await,
                Err(_) => std::future::pending::<()>().await,
            }
        };

        let result = tokio::select! {
            result = serve => result,
            _ = deadline => {
                tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed, dropping open connections");
                Ok(())
            }
        };

        health.stop();
        tracing::info!("HTTP server stopped");
        result
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn metrics(&self) -> &Arc<ProxyMetrics> {
        self.dispatcher.metrics()
    }

    pub fn balancer(&self) -> &Arc<dyn LoadBalancer> {
        self.dispatcher.balancer()
    }
}

/// Catch-all handler: every method and path is forwarded.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    state.dispatcher.dispatch(request, client_addr).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn config_with(url: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends.push(BackendConfig {
            name: "a".into(),
            url: url.into(),
            health: "/health".into(),
            weight: 1,
            enabled: true,
        });
        config.load_balancer.method = "round-robin".into();
        config
    }

    #[tokio::test]
    async fn test_no_available_backend_returns_503_with_request_id() {
        let server = HttpServer::new(config_with("http://127.0.0.1:9"));
        server.pool().get("a").unwrap().set_healthy(false);

        let response = server
            .router
            .clone()
            .oneshot(Request::builder().uri("/anything").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("x-request-id").is_some());
        assert_eq!(server.metrics().snapshot().errors.failures, 1);
    }
}
