//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track lifetime connection count
//! - Track health state, last check time and probe backoff
//! - Build upstream URIs for forwarded requests and health probes

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use axum::http::Uri;
use serde::Serialize;
use url::Url;

use crate::config::BackendConfig;
use crate::error::ProxyError;
use crate::resilience::backoff::next_backoff;

/// Mutable live state of a backend, guarded by the backend's own lock.
#[derive(Debug)]
struct BackendState {
    enabled: bool,
    healthy: bool,
    connections: u64,
    last_checked: Option<Instant>,
    backoff: Duration,
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    name: String,
    url: Url,
    health_path: String,
    weight: u32,
    state: RwLock<BackendState>,
}

impl Backend {
    /// Create a new backend. It starts healthy with no backoff.
    pub fn new(name: impl Into<String>, url: Url, health_path: impl Into<String>, weight: u32, enabled: bool) -> Self {
        Self {
            name: name.into(),
            url,
            health_path: health_path.into(),
            weight,
            state: RwLock::new(BackendState {
                enabled,
                healthy: true,
                connections: 0,
                last_checked: None,
                backoff: Duration::ZERO,
            }),
        }
    }

    /// Build a backend from its configuration entry.
    ///
    /// Fails when the base URL does not parse or has no host.
    pub fn from_config(config: &BackendConfig) -> Result<Self, url::ParseError> {
        let url = Url::parse(&config.url)?;
        if !url.has_host() {
            return Err(url::ParseError::EmptyHost);
        }
        let weight = u32::try_from(config.weight.max(1)).unwrap_or(u32::MAX);
        Ok(Self::new(&config.name, url, &config.health, weight, config.enabled))
    }

    fn read(&self) -> RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Enabled AND healthy.
    pub fn is_available(&self) -> bool {
        let state = self.read();
        state.enabled && state.healthy
    }

    pub fn is_healthy(&self) -> bool {
        self.read().healthy
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.write().healthy = healthy;
    }

    pub fn is_enabled(&self) -> bool {
        self.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.write().enabled = enabled;
    }

    /// Number of connections made to this backend over its lifetime.
    pub fn connections(&self) -> u64 {
        self.read().connections
    }

    pub fn add_connection(&self) {
        self.write().connections += 1;
    }

    /// When the backend was last probed, if ever.
    pub fn checked(&self) -> Option<Instant> {
        self.read().last_checked
    }

    pub fn set_checked(&self, now: Instant) {
        self.write().last_checked = Some(now);
    }

    pub fn backoff(&self) -> Duration {
        self.read().backoff
    }

    /// Advance the probe backoff one step (1s doubling, capped at 60s).
    pub fn exp_backoff(&self) -> Duration {
        let mut state = self.write();
        state.backoff = next_backoff(state.backoff);
        state.backoff
    }

    pub fn reset_backoff(&self) {
        self.write().backoff = Duration::ZERO;
    }

    /// The health probe URL: base address joined with the health path.
    pub fn health_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_path(&join_paths(self.url.path(), &self.health_path));
        url.set_query(None);
        url.to_string()
    }

    /// Rewrite an inbound request URI to target this backend.
    ///
    /// Scheme and authority come from the backend; the backend's base path is
    /// prefixed to the inbound path; the query string is kept.
    pub fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, ProxyError> {
        let path = join_paths(self.url.path(), inbound.path());
        let path_and_query = match inbound.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        Uri::builder()
            .scheme(self.url.scheme())
            .authority(self.authority())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| ProxyError::Transport(format!("invalid upstream uri for {}: {}", self.name, e)))
    }

    /// `host[:port]` of the backend, as sent in the `Host` header.
    pub fn authority(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Point-in-time read snapshot for status reporting.
    pub fn snapshot(&self) -> BackendSnapshot {
        let state = self.read();
        BackendSnapshot {
            name: self.name.clone(),
            url: self.url.to_string(),
            health: self.health_path.clone(),
            enabled: state.enabled,
            weight: self.weight,
            healthy: state.healthy,
            connections: state.connections,
            backoff_secs: state.backoff.as_secs(),
        }
    }
}

/// Serializable view of a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSnapshot {
    pub name: String,
    pub url: String,
    pub health: String,
    pub enabled: bool,
    pub weight: u32,
    pub healthy: bool,
    pub connections: u64,
    pub backoff_secs: u64,
}

/// Join a base path and a request path with exactly one `/` between them.
fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
