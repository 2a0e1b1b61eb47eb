//! Weighted random load balancing strategy.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::Rng;

use crate::error::ProxyError;
use crate::load_balancer::{Backend, BackendPool, LoadBalancer, Method};

/// Weighted selector.
///
/// Draws `r` in `[1, total]` from the OS random source and walks the
/// available set subtracting weights until `r` drops to zero or below.
#[derive(Debug)]
pub struct Weighted {
    pool: Arc<BackendPool>,
}

impl Weighted {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        Self { pool }
    }
}

/// Cumulative walk over `backends` for a draw `r` in `[1, total]`.
///
/// Falls back to the last backend if the walk ends without a pick.
fn pick(backends: &[Arc<Backend>], mut r: i64) -> Option<&Arc<Backend>> {
    for backend in backends {
        r -= i64::from(backend.weight());
        if r <= 0 {
            return Some(backend);
        }
    }
    backends.last()
}

impl LoadBalancer for Weighted {
    fn pool(&self) -> &BackendPool {
        &self.pool
    }

    fn next_backend(&self) -> Result<Arc<Backend>, ProxyError> {
        let backends = self.pool.available_backends()?;

        let total: i64 = backends.iter().map(|b| i64::from(b.weight())).sum();
        if total <= 0 {
            return Err(ProxyError::ZeroWeight);
        }

        let r = OsRng.gen_range(1..=total);
        pick(&backends, r).cloned().ok_or(ProxyError::NoBackendsAvailable)
    }

    fn method(&self) -> Method {
        Method::Weighted
    }
}
