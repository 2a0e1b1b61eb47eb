//! Least connections load balancing strategy.
//!
//! Currently selects uniformly at random among available backends; it does
//! not rank by connection count. Backends only track a lifetime connection
//! total, not in-flight requests, so there is no load figure to rank by.

use std::sync::Arc;

use crate::error::ProxyError;
use crate::load_balancer::{Backend, BackendPool, LoadBalancer, Method};

/// Least connections selector.
#[derive(Debug)]
pub struct LeastConnections {
    pool: Arc<BackendPool>,
}

impl LeastConnections {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        Self { pool }
    }
}

impl LoadBalancer for LeastConnections {
    fn pool(&self) -> &BackendPool {
        &self.pool
    }

    fn next_backend(&self) -> Result<Arc<Backend>, ProxyError> {
        let backends = self.pool.available_backends()?;
        Ok(backends[fastrand::usize(..backends.len())].clone())
    }

    fn method(&self) -> Method {
        Method::LeastConnections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::pool_of;

    #[test]
    fn test_least_conn_ignores_connection_counts() {
        let pool = pool_of(&[("b1", 1), ("b2", 1)]);
        let lb = LeastConnections::new(pool.clone());

        // b1 is far busier, yet both keep being selected
        for _ in 0..100 {
            pool.get("b1").unwrap().add_connection();
        }

        let mut b1_hits = 0;
        for _ in 0..1_000 {
            if lb.next_backend().unwrap().name() == "b1" {
                b1_hits += 1;
            }
        }
        assert!((350..650).contains(&b1_hits), "b1 hits: {}", b1_hits);
    }
}
