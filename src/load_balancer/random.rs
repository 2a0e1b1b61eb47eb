//! Uniform random load balancing strategy.

use std::sync::Arc;

use crate::error::ProxyError;
use crate::load_balancer::{Backend, BackendPool, LoadBalancer, Method};

/// Picks uniformly among available backends.
#[derive(Debug)]
pub struct Random {
    pool: Arc<BackendPool>,
}

impl Random {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        Self { pool }
    }
}

impl LoadBalancer for Random {
    fn pool(&self) -> &BackendPool {
        &self.pool
    }

    fn next_backend(&self) -> Result<Arc<Backend>, ProxyError> {
        let backends = self.pool.available_backends()?;
        Ok(backends[fastrand::usize(..backends.len())].clone())
    }

    fn method(&self) -> Method {
        Method::Random
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::pool_of;
    use std::collections::HashMap;

    #[test]
    fn test_random_covers_all_backends() {
        let lb = Random::new(pool_of(&[("a", 1), ("b", 1), ("c", 1)]));
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..3_000 {
            *counts.entry(lb.next_backend().unwrap().name().to_string()).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        for (name, count) in counts {
            assert!((800..1200).contains(&count), "{}: {}", name, count);
        }
    }
}
