//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at dispatcher
//!     → pool.rs (fresh snapshot of available backends)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through backends)
//!         - random.rs (uniform pick)
//!         - weighted.rs (cumulative weight walk)
//!         - least_conn.rs (uniform pick, see module docs)
//!     → Return backend or NoBackendsAvailable
//! ```
//!
//! # Design Decisions
//! - Strategies hold a shared pool handle; only round-robin keeps state
//! - Disabled and unhealthy backends are filtered out before any algorithm runs
//! - The available set is recomputed on every call, never cached

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod weighted;

pub use backend::{Backend, BackendSnapshot};
pub use pool::BackendPool;

use crate::error::ProxyError;

/// A backend selection strategy.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// The pool this strategy selects from.
    fn pool(&self) -> &BackendPool;

    /// Pick the next backend from the currently available set.
    fn next_backend(&self) -> Result<Arc<Backend>, ProxyError>;

    fn method(&self) -> Method;

    /// Size of the currently available set; zero when none are available.
    fn count_available_backends(&self) -> usize {
        self.pool().available_backends().map(|b| b.len()).unwrap_or(0)
    }
}

/// Configured strategy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    RoundRobin,
    Random,
    Weighted,
    LeastConnections,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::RoundRobin => "round-robin",
            Method::Random => "random",
            Method::Weighted => "weighted",
            Method::LeastConnections => "least-connections",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" => Ok(Method::RoundRobin),
            "random" => Ok(Method::Random),
            "weighted" => Ok(Method::Weighted),
            "least-connections" => Ok(Method::LeastConnections),
            other => Err(format!("unknown load balancer method '{}'", other)),
        }
    }
}

/// Build the strategy for `method` over `pool`.
pub fn resolve(method: Method, pool: Arc<BackendPool>) -> Arc<dyn LoadBalancer> {
    match method {
        Method::RoundRobin => Arc::new(round_robin::RoundRobin::new(pool)),
        Method::Random => Arc::new(random::Random::new(pool)),
        Method::Weighted => Arc::new(weighted::Weighted::new(pool)),
        Method::LeastConnections => Arc::new(least_conn::LeastConnections::new(pool)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use url::Url;

    /// Pool of `(name, weight)` backends on distinct local ports, all healthy.
    pub fn pool_of(specs: &[(&str, u32)]) -> Arc<BackendPool> {
        let backends = specs
            .iter()
            .enumerate()
            .map(|(i, (name, weight))| {
                let url = Url::parse(&format!("http://127.0.0.1:{}", 18000 + i)).unwrap();
                Backend::new(*name, url, "/health", *weight, true)
            })
            .collect();
        Arc::new(BackendPool::new(backends))
    }
}
