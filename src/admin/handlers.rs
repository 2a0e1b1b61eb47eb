use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::AdminState;
use crate::config::ProxyConfig;
use crate::load_balancer::BackendSnapshot;
use crate::observability::metrics::MetricsSnapshot;

const SERVICE: &str = "proxymity";

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: u64,
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: u64,
    pub uptime: f64,
    pub load_balancer: String,
    pub backends: BackendsReport,
}

#[derive(Debug, Serialize)]
pub struct BackendsReport {
    pub total: usize,
    pub healthy: usize,
    pub details: Vec<BackendSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub service: &'static str,
    pub timestamp: u64,
    pub config: ProxyConfig,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness of the proxy process itself.
pub async fn get_health(State(state): State<AdminState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        service: SERVICE,
        timestamp: unix_now(),
        uptime: state.started.elapsed().as_secs_f64(),
    })
}

/// Pool snapshot. `unhealthy` (503) when no backend passes its health check,
/// `degraded` when some do not.
pub async fn get_status(State(state): State<AdminState>) -> (StatusCode, Json<StatusReport>) {
    let details = state.pool.snapshot();
    let total = details.len();
    let healthy = details.iter().filter(|b| b.healthy).count();

    let (status, code) = if healthy == 0 {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    } else if healthy < total {
        ("degraded", StatusCode::OK)
    } else {
        ("healthy", StatusCode::OK)
    };

    let report = StatusReport {
        status,
        service: SERVICE,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: unix_now(),
        uptime: state.started.elapsed().as_secs_f64(),
        load_balancer: state.config.method().to_string(),
        backends: BackendsReport {
            total,
            healthy,
            details,
        },
    };
    (code, Json(report))
}

pub async fn get_config(State(state): State<AdminState>) -> Json<ConfigReport> {
    Json(ConfigReport {
        service: SERVICE,
        timestamp: unix_now(),
        config: (*state.config).clone(),
    })
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
