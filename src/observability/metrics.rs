//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Aggregate traffic, latency and error counters for the admin surface
//! - Mirror every update to the `metrics` facade
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwarded attempts by backend
//! - `proxy_responses_total` (counter): terminal responses by status
//! - `proxy_request_duration_seconds` (histogram): terminal attempt latency
//! - `proxy_upstream_errors_total` (counter): errors by category
//! - `proxy_backend_health` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Publish a backend's health as a gauge.
pub fn record_backend_health(backend: &str, healthy: bool) {
    metrics::gauge!("proxy_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Aggregate proxy counters, shared by every request task.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    requests: AtomicU64,
    responses: AtomicU64,
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,

    errors_total: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    transport_errors: AtomicU64,
    timeouts: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,

    latency: Mutex<Latency>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Latency {
    min_ms: f64,
    max_ms: f64,
    sum_ms: f64,
    count: u64,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request was forwarded to `backend`.
    pub fn record_attempt(&self, backend: &str, bytes_in: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.bytes_in.fetch_add(bytes_in, Ordering::Relaxed);
        metrics::counter!("proxy_requests_total", "backend" => backend.to_string()).increment(1);
    }

    /// A response reached the caller.
    pub fn record_response(&self, status: u16, latency: Duration) {
        self.responses.fetch_add(1, Ordering::Relaxed);
        self.record_latency(latency);
        metrics::counter!("proxy_responses_total", "status" => status.to_string()).increment(1);
        metrics::histogram!("proxy_request_duration_seconds").record(latency.as_secs_f64());
    }

    pub fn add_bytes_out(&self, bytes: u64) {
        self.bytes_out.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_client_error(&self) {
        self.client_errors.fetch_add(1, Ordering::Relaxed);
        self.record_error("client_error");
    }

    pub fn record_server_error(&self) {
        self.server_errors.fetch_add(1, Ordering::Relaxed);
        self.record_error("server_error");
    }

    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
        self.record_error("transport_error");
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.record_error("timeout");
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// A request ended without any backend response.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("proxy_failures_total").increment(1);
    }

    fn record_error(&self, category: &'static str) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("proxy_upstream_errors_total", "category" => category).increment(1);
    }

    fn record_latency(&self, latency: Duration) {
        let ms = latency.as_secs_f64() * 1000.0;
        let mut l = self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if l.count == 0 || ms < l.min_ms {
            l.min_ms = ms;
        }
        if ms > l.max_ms {
            l.max_ms = ms;
        }
        l.count += 1;
        l.sum_ms += ms;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        let avg_ms = if latency.count == 0 {
            0.0
        } else {
            latency.sum_ms / latency.count as f64
        };

        MetricsSnapshot {
            traffic: TrafficSnapshot {
                requests: self.requests.load(Ordering::Relaxed),
                responses: self.responses.load(Ordering::Relaxed),
                bytes_in: self.bytes_in.load(Ordering::Relaxed),
                bytes_out: self.bytes_out.load(Ordering::Relaxed),
            },
            latency: LatencySnapshot {
                min_ms: latency.min_ms,
                max_ms: latency.max_ms,
                avg_ms,
                samples: latency.count,
            },
            errors: ErrorSnapshot {
                total: self.errors_total.load(Ordering::Relaxed),
                client: self.client_errors.load(Ordering::Relaxed),
                server: self.server_errors.load(Ordering::Relaxed),
                transport: self.transport_errors.load(Ordering::Relaxed),
                timeouts: self.timeouts.load(Ordering::Relaxed),
                retries: self.retries.load(Ordering::Relaxed),
                failures: self.failures.load(Ordering::Relaxed),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub traffic: TrafficSnapshot,
    pub latency: LatencySnapshot,
    pub errors: ErrorSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficSnapshot {
    pub requests: u64,
    pub responses: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySnapshot {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub samples: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSnapshot {
    pub total: u64,
    pub client: u64,
    pub server: u64,
    pub transport: u64,
    pub timeouts: u64,
    pub retries: u64,
    pub failures: u64,
}
