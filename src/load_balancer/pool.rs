//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends
//! - Answer availability queries with a fresh snapshot every time
//! - Provide read snapshots for status reporting

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::error::ProxyError;
use crate::load_balancer::backend::{Backend, BackendSnapshot};

/// The registered backends.
///
/// Membership is fixed at construction, so reads need no pool-level lock.
/// Per-backend state is guarded inside each [`Backend`].
#[derive(Debug, Default)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
}

impl BackendPool {
    pub fn new(backends: Vec<Backend>) -> Self {
        Self {
            backends: backends.into_iter().map(Arc::new).collect(),
        }
    }

    /// Create a pool from configuration.
    ///
    /// A backend whose URL fails to parse is skipped; the others still load.
    pub fn from_config(configs: &[BackendConfig]) -> Self {
        let mut backends = Vec::with_capacity(configs.len());
        for config in configs {
            match Backend::from_config(config) {
                Ok(backend) => {
                    tracing::info!(
                        backend = %backend.name(),
                        url = %backend.url(),
                        weight = backend.weight(),
                        enabled = config.enabled,
                        "Backend registered"
                    );
                    backends.push(backend);
                }
                Err(e) => {
                    tracing::warn!(
                        backend = %config.name,
                        url = %config.url,
                        error = %e,
                        "Skipping backend with invalid url"
                    );
                }
            }
        }
        Self::new(backends)
    }

    /// Every registered backend, in configuration order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// The backends that are enabled and healthy right now, in pool order.
    pub fn available_backends(&self) -> Result<Vec<Arc<Backend>>, ProxyError> {
        let available: Vec<Arc<Backend>> = self
            .backends
            .iter()
            .filter(|b| b.is_available())
            .cloned()
            .collect();

        if available.is_empty() {
            return Err(ProxyError::NoBackendsAvailable);
        }
        Ok(available)
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Backend>> {
        self.backends.iter().find(|b| b.name() == name).cloned()
    }

    pub fn snapshot(&self) -> Vec<BackendSnapshot> {
        self.backends.iter().map(|b| b.snapshot()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, url: &str) -> BackendConfig {
        BackendConfig {
            name: name.to_string(),
            url: url.to_string(),
            health: "/health".to_string(),
            weight: 1,
            enabled: true,
        }
    }

    #[test]
    fn test_invalid_url_is_skipped() {
        let pool = BackendPool::from_config(&[
            config("a", "http://127.0.0.1:3001"),
            config("bad", "not a url"),
            config("c", "http://127.0.0.1:3003"),
        ]);
        assert_eq!(pool.len(), 2);
        let names: Vec<_> = pool.backends().iter().map(|b| b.name().to_string()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_available_excludes_disabled_and_unhealthy() {
        let mut disabled = config("b", "http://127.0.0.1:3002");
        disabled.enabled = false;
        let pool = BackendPool::from_config(&[
            config("a", "http://127.0.0.1:3001"),
            disabled,
            config("c", "http://127.0.0.1:3003"),
        ]);
        pool.get("c").unwrap().set_healthy(false);

        let available = pool.available_backends().unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name(), "a");
    }

    #[test]
    fn test_empty_available_set_is_error() {
        let pool = BackendPool::from_config(&[config("a", "http://127.0.0.1:3001")]);
        pool.get("a").unwrap().set_healthy(false);
        assert_eq!(pool.available_backends().unwrap_err(), ProxyError::NoBackendsAvailable);

        let empty = BackendPool::default();
        assert_eq!(empty.available_backends().unwrap_err(), ProxyError::NoBackendsAvailable);
    }

    #[test]
    fn test_available_is_recomputed() {
        let pool = BackendPool::from_config(&[config("a", "http://127.0.0.1:3001")]);
        let a = pool.get("a").unwrap();
        a.set_healthy(false);
        assert!(pool.available_backends().is_err());
        a.set_healthy(true);
        assert_eq!(pool.available_backends().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot() {
        let pool = BackendPool::from_config(&[config("a", "http://127.0.0.1:3001")]);
        pool.get("a").unwrap().add_connection();
        let snap = pool.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].name, "a");
        assert_eq!(snap[0].url, "http://127.0.0.1:3001/");
        assert!(snap[0].healthy);
        assert_eq!(snap[0].connections, 1);
    }
}
