//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend health state based on results
//! - Throttle re-probing of failing backends by their backoff

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, Method, Request};
use http_body_util::BodyExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{Defaults, HealthCheckConfig};
use crate::error::ProxyError;
use crate::health::state::{apply_probe, should_probe, ProbeOutcome, Transition};
use crate::http::client::{build_client, UpstreamClient};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics::record_backend_health;
use crate::resilience::timeouts::classify_transport_error;

const USER_AGENT: &str = "proxymity-health-check";

/// Sweeps the pool on a fixed interval.
pub struct HealthChecker {
    pool: Arc<BackendPool>,
    interval: Duration,
    timeout: Duration,
    client: UpstreamClient,
}

impl HealthChecker {
    /// A zero `interval` or `timeout` is replaced by the built-in default.
    pub fn new(pool: Arc<BackendPool>, interval: Duration, timeout: Duration) -> Self {
        let defaults = Defaults::default();
        let interval = if interval.is_zero() {
            Duration::from_secs(defaults.health_interval_secs)
        } else {
            interval
        };
        let timeout = if timeout.is_zero() {
            Duration::from_secs(defaults.health_timeout_secs)
        } else {
            timeout
        };

        Self {
            pool,
            interval,
            timeout,
            client: build_client(timeout),
        }
    }

    /// Build from a defaulted health check configuration.
    pub fn from_config(pool: Arc<BackendPool>, config: &HealthCheckConfig) -> Self {
        Self::new(pool, config.interval(), config.timeout())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sweep on every tick until `shutdown` fires.
    ///
    /// An in-flight sweep is not interrupted; each probe is bounded by the
    /// probe timeout.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            backends = self.pool.len(),
            "Health checker starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health checker received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> HealthCheckHandle {
        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        let task = tokio::spawn(self.run(receiver));
        HealthCheckHandle { shutdown, task }
    }

    /// One sweep of the pool at the current time.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    /// One sweep of the pool, treating `now` as the current time.
    ///
    /// Returns how many backends were probed.
    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut probed = 0;

        for backend in self.pool.backends() {
            if !should_probe(backend, now) {
                tracing::debug!(
                    backend = %backend.name(),
                    backoff_ms = backend.backoff().as_millis() as u64,
                    "Skipping probe during backoff"
                );
                continue;
            }

            let outcome = self.probe(backend).await;
            probed += 1;

            match apply_probe(backend, &outcome, now) {
                Transition::BecameUnhealthy => tracing::warn!(
                    backend = %backend.name(),
                    outcome = ?outcome,
                    backoff_ms = backend.backoff().as_millis() as u64,
                    "Backend marked unhealthy"
                ),
                Transition::BecameHealthy => tracing::info!(
                    backend = %backend.name(),
                    "Backend recovered"
                ),
                Transition::Unchanged if !outcome.is_success() => tracing::debug!(
                    backend = %backend.name(),
                    outcome = ?outcome,
                    backoff_ms = backend.backoff().as_millis() as u64,
                    "Backend still unhealthy"
                ),
                Transition::Unchanged => {}
            }

            record_backend_health(backend.name(), backend.is_healthy());
        }

        probed
    }

    /// GET the backend's health URL and drain the body frame by frame, all
    /// within the probe timeout.
    pub async fn probe(&self, backend: &Backend) -> ProbeOutcome {
        let url = backend.health_url();
        let request = match Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return ProbeOutcome::Failed(format!("invalid health url {}: {}", url, e)),
        };

        let attempt = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| classify_transport_error(&e))?;
            let status = response.status();
            let mut body = Body::new(response.into_body());
            while let Some(frame) = body.frame().await {
                frame.map_err(|e| ProxyError::Transport(e.to_string()))?;
            }
            Ok::<_, ProxyError>(status)
        };

        match time::timeout(self.timeout, attempt).await {
            Ok(Ok(status)) if status.is_success() => ProbeOutcome::Success(status.as_u16()),
            Ok(Ok(status)) => ProbeOutcome::Status(status.as_u16()),
            Ok(Err(e)) => ProbeOutcome::Failed(e.to_string()),
            Err(_) => ProbeOutcome::Failed(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            )),
        }
    }
}

/// Handle to a spawned health checker.
pub struct HealthCheckHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl HealthCheckHandle {
    /// Stop the ticker. A probe already in flight finishes on its own timeout.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the checker task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Health checker task failed");
        }
    }
}
