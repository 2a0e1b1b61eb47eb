//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::ProxyError;
use crate::load_balancer::{Backend, BackendPool, LoadBalancer, Method};

/// Round-robin selector.
///
/// A single counter is advanced atomically on every call and taken modulo
/// the size of the available set at that moment, so the ring shrinks and
/// grows with backend health.
#[derive(Debug)]
pub struct RoundRobin {
    pool: Arc<BackendPool>,
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        Self {
            pool,
            counter: AtomicUsize::new(0),
        }
    }
}

impl LoadBalancer for RoundRobin {
    fn pool(&self) -> &BackendPool {
        &self.pool
    }

    fn next_backend(&self) -> Result<Arc<Backend>, ProxyError> {
        let backends = self.pool.available_backends()?;
        // fetch_add returns the pre-increment value, i.e. counter - 1
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % backends.len();
        Ok(backends[index].clone())
    }

    fn method(&self) -> Method {
        Method::RoundRobin
    }
}
