//! Request dispatch with retry across backends.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → budget = number of available backends
//!     → loop while budget remains:
//!         strategy picks backend (error ends the loop)
//!         count connection, forward under the per-attempt deadline
//!         response (any status) → relay to caller
//!         transport error / timeout → count, try the next backend
//!     → budget exhausted → 503 with the last error
//! ```
//!
//! # Design Decisions
//! - HTTP error statuses are responses, never retried and never touch health
//! - No backoff between attempts; the next attempt goes out immediately
//! - Health state is the health checker's alone; failed attempts do not mark
//!   backends unhealthy

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{Request, Response, StatusCode, Version};

use crate::error::ProxyError;
use crate::http::client::UpstreamClient;
use crate::http::request::{content_length, prepare_forward_headers, SharedBody, X_REQUEST_ID};
use crate::http::response;
use crate::load_balancer::{Backend, LoadBalancer};
use crate::observability::metrics::ProxyMetrics;
use crate::resilience::retries::RetryBudget;
use crate::resilience::timeouts::call_with_timeout;

/// Classification of a backend response by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Below 400.
    Success,
    /// 400..=499.
    ClientError,
    /// 500 and above.
    ServerError,
}

impl Outcome {
    pub fn classify(status: StatusCode) -> Self {
        match status.as_u16() {
            400..=499 => Outcome::ClientError,
            s if s >= 500 => Outcome::ServerError,
            _ => Outcome::Success,
        }
    }
}

/// Forwards each inbound request to one backend, retrying on transport failure.
#[derive(Debug, Clone)]
pub struct ProxyDispatcher {
    balancer: Arc<dyn LoadBalancer>,
    client: UpstreamClient,
    metrics: Arc<ProxyMetrics>,
    request_timeout: Duration,
}

impl ProxyDispatcher {
    pub fn new(
        balancer: Arc<dyn LoadBalancer>,
        client: UpstreamClient,
        metrics: Arc<ProxyMetrics>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            balancer,
            client,
            metrics,
            request_timeout,
        }
    }

    pub fn balancer(&self) -> &Arc<dyn LoadBalancer> {
        &self.balancer
    }

    pub fn metrics(&self) -> &Arc<ProxyMetrics> {
        &self.metrics
    }

    /// Forward `request` and produce the caller's response.
    ///
    /// Never fails: when no backend answers, the result is a `503` naming the
    /// last error seen.
    pub async fn dispatch(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let bytes_in = content_length(request.headers());

        let (parts, body) = request.into_parts();
        let body = SharedBody::new(body);

        let mut budget = RetryBudget::new(self.balancer.count_available_backends());
        let mut last_error = ProxyError::NoBackendsAvailable;

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            path = %parts.uri.path(),
            max_tries = budget.max_tries(),
            "Dispatching request"
        );

        while budget.has_remaining() {
            let backend = match self.balancer.next_backend() {
                Ok(backend) => backend,
                Err(e) => {
                    tracing::warn!(request_id = %request_id, error = %e, "Backend selection failed");
                    // an earlier attempt's failure is the more useful report
                    if budget.attempts() == 0 {
                        last_error = e;
                    }
                    break;
                }
            };

            budget.record_attempt();
            backend.add_connection();
            self.metrics.record_attempt(backend.name(), bytes_in);

            let started = Instant::now();
            let result = match build_upstream_request(&parts, &backend, body.attempt(), client_addr) {
                Ok(upstream) => call_with_timeout(self.request_timeout, self.client.request(upstream)).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(upstream_response) => {
                    let status = upstream_response.status();
                    match Outcome::classify(status) {
                        Outcome::ClientError => self.metrics.record_client_error(),
                        Outcome::ServerError => self.metrics.record_server_error(),
                        Outcome::Success => {}
                    }
                    let latency = started.elapsed();
                    self.metrics.record_response(status.as_u16(), latency);

                    tracing::info!(
                        request_id = %request_id,
                        backend = %backend.name(),
                        status = status.as_u16(),
                        attempt = budget.attempts(),
                        latency_ms = latency.as_millis() as u64,
                        "Request forwarded"
                    );
                    return response::relay(upstream_response, self.metrics.clone());
                }
                Err(e) => {
                    match &e {
                        ProxyError::Timeout(_) => self.metrics.record_timeout(),
                        _ => self.metrics.record_transport_error(),
                    }

                    if !e.is_retryable() {
                        tracing::warn!(
                            request_id = %request_id,
                            backend = %backend.name(),
                            error = %e,
                            "Upstream attempt failed, not retryable"
                        );
                        last_error = e;
                        break;
                    }
                    self.metrics.record_retry();

                    tracing::warn!(
                        request_id = %request_id,
                        backend = %backend.name(),
                        attempt = budget.attempts(),
                        max_tries = budget.max_tries(),
                        error = %e,
                        "Upstream attempt failed"
                    );
                    last_error = e;

                    if body.is_spent() {
                        tracing::warn!(request_id = %request_id, "Request body already sent, not retrying");
                        break;
                    }
                }
            }
        }

        self.metrics.record_failure();
        tracing::error!(
            request_id = %request_id,
            attempts = budget.attempts(),
            error = %last_error,
            "No backend produced a response"
        );
        response::unavailable(&last_error)
    }
}

/// Build the request for one attempt against `backend`.
fn build_upstream_request(
    parts: &Parts,
    backend: &Backend,
    body: Body,
    client_addr: Option<SocketAddr>,
) -> Result<Request<Body>, ProxyError> {
    let uri = backend.upstream_uri(&parts.uri)?;

    let mut headers = parts.headers.clone();
    prepare_forward_headers(&mut headers, backend, client_addr);

    let mut request = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .version(Version::HTTP_11)
        .body(body)
        .map_err(|e| ProxyError::Transport(format!("failed to build upstream request: {}", e)))?;
    *request.headers_mut() = headers;
    Ok(request)
}
