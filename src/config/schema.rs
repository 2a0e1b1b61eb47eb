//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Fields left empty or zero in the file are filled from [`Defaults`] by
//! [`ProxyConfig::apply_defaults`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::load_balancer::Method;

/// Built-in default values, resolved once at startup and passed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub load_balancer_method: Method,
    pub health_check_path: &'static str,
    pub backend_weight: u32,
    pub health_interval_secs: u64,
    pub health_timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            load_balancer_method: Method::RoundRobin,
            health_check_path: "/health",
            backend_weight: 1,
            health_interval_secs: 10,
            health_timeout_secs: 3,
        }
    }
}

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Proxy listener configuration.
    pub listener: ListenerConfig,

    /// Admin (status) listener configuration.
    pub admin: AdminConfig,

    /// Backend server definitions, in selection order.
    pub backends: Vec<BackendConfig>,

    /// Load balancing strategy.
    pub load_balancer: LoadBalancerConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Shutdown behaviour.
    pub lifecycle: LifecycleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Fill unspecified values from `defaults`, returning a warning per
    /// substituted or suspicious value.
    pub fn apply_defaults(&mut self, defaults: &Defaults) -> Vec<String> {
        let mut warnings = Vec::new();

        for backend in &mut self.backends {
            if backend.health.is_empty() {
                backend.health = defaults.health_check_path.to_string();
                warnings.push(format!(
                    "backend '{}': health check path not specified, using default: {}",
                    backend.name, defaults.health_check_path
                ));
            }
            if backend.weight <= 0 {
                let old = backend.weight;
                backend.weight = i64::from(defaults.backend_weight);
                if old != 0 {
                    warnings.push(format!(
                        "backend '{}': invalid weight {}, using default: {}",
                        backend.name, old, defaults.backend_weight
                    ));
                }
            }
        }

        let default_method = defaults.load_balancer_method.as_str();
        if self.load_balancer.method.is_empty() {
            self.load_balancer.method = default_method.to_string();
            warnings.push(format!(
                "load balancer method not specified, using default: {}",
                default_method
            ));
        } else if self.load_balancer.method.parse::<Method>().is_err() {
            warnings.push(format!(
                "invalid load balancer method '{}', using default: {}",
                self.load_balancer.method, default_method
            ));
            self.load_balancer.method = default_method.to_string();
        }

        let hc = &mut self.health_check;
        if hc.interval_secs == 0 {
            hc.interval_secs = defaults.health_interval_secs;
            warnings.push(format!(
                "health check interval not specified, using default: {} seconds",
                defaults.health_interval_secs
            ));
        }
        if hc.timeout_secs == 0 {
            hc.timeout_secs = defaults.health_timeout_secs;
            warnings.push(format!(
                "health check timeout not specified, using default: {} seconds",
                defaults.health_timeout_secs
            ));
        }
        if hc.timeout_secs >= hc.interval_secs {
            warnings.push(format!(
                "health check timeout ({}s) should be less than interval ({}s)",
                hc.timeout_secs, hc.interval_secs
            ));
        }

        warnings
    }

    /// The resolved load balancing method. Unknown names fall back to round-robin.
    pub fn method(&self) -> Method {
        self.load_balancer.method.parse().unwrap_or_default()
    }
}

/// Proxy listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Admin listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoints.
    pub enabled: bool,

    /// Admin bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Base URL of the backend (e.g., "http://127.0.0.1:3000").
    pub url: String,

    /// Health check path, starting with `/`. Empty means the default.
    #[serde(default)]
    pub health: String,

    /// Weight for weighted load balancing. Zero or negative means the default.
    #[serde(default)]
    pub weight: i64,

    /// Whether the backend receives traffic.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Load balancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancerConfig {
    /// One of `round-robin`, `random`, `weighted`, `least-connections`.
    pub method: String,
}

/// Health check configuration. Zero means "use the default".
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Sweep interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        let defaults = Defaults::default();
        Self {
            interval_secs: defaults.health_interval_secs,
            timeout_secs: defaults.health_timeout_secs,
        }
    }
}

impl HealthCheckConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Time allowed per attempt for the backend to return response headers, in milliseconds.
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            request_ms: 30_000,
        }
    }
}

/// Shutdown behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Time allowed for in-flight requests after a shutdown signal.
    pub grace_period_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: `pretty` or `json`.
    pub log_format: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(name: &str) -> BackendConfig {
        BackendConfig {
            name: name.to_string(),
            url: "http://127.0.0.1:3000".to_string(),
            health: String::new(),
            weight: 0,
            enabled: true,
        }
    }

    #[test]
    fn test_defaults_fill_empty_values() {
        let mut config = ProxyConfig::default();
        config.backends.push(backend("a"));

        let warnings = config.apply_defaults(&Defaults::default());

        assert_eq!(config.backends[0].health, "/health");
        assert_eq!(config.backends[0].weight, 1);
        assert_eq!(config.load_balancer.method, "round-robin");
        assert_eq!(config.health_check.interval_secs, 10);
        assert_eq!(config.health_check.timeout_secs, 3);
        // health path and method; zero weight is silent
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_health_check_default_is_usable() {
        let hc = HealthCheckConfig::default();
        assert_eq!(hc.interval(), Duration::from_secs(10));
        assert_eq!(hc.timeout(), Duration::from_secs(3));
        assert!(hc.timeout() < hc.interval());
    }

    #[test]
    fn test_explicit_zero_interval_is_defaulted() {
        let mut config = ProxyConfig::default();
        config.health_check.interval_secs = 0;
        config.health_check.timeout_secs = 0;
        let warnings = config.apply_defaults(&Defaults::default());
        assert_eq!(config.health_check.interval_secs, 10);
        assert_eq!(config.health_check.timeout_secs, 3);
        assert!(warnings.iter().any(|w| w.contains("interval not specified")));
    }

    #[test]
    fn test_negative_weight_warns() {
        let mut config = ProxyConfig::default();
        let mut b = backend("a");
        b.weight = -4;
        b.health = "/ping".into();
        config.backends.push(b);

        let warnings = config.apply_defaults(&Defaults::default());
        assert_eq!(config.backends[0].weight, 1);
        assert!(warnings.iter().any(|w| w.contains("invalid weight -4")));
    }

    #[test]
    fn test_unknown_method_resolves_to_round_robin() {
        let mut config = ProxyConfig::default();
        config.load_balancer.method = "fastest".into();
        let warnings = config.apply_defaults(&Defaults::default());
        assert_eq!(config.method(), Method::RoundRobin);
        assert!(warnings.iter().any(|w| w.contains("'fastest'")));
    }

    #[test]
    fn test_timeout_not_below_interval_warns() {
        let mut config = ProxyConfig::default();
        config.health_check.interval_secs = 2;
        config.health_check.timeout_secs = 5;
        let warnings = config.apply_defaults(&Defaults::default());
        assert_eq!(config.health_check.timeout_secs, 5);
        assert!(warnings.iter().any(|w| w.contains("should be less than interval")));
    }

    #[test]
    fn test_parse_toml() {
        let raw = r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [load_balancer]
            method = "weighted"

            [[backends]]
            name = "api-1"
            url = "http://10.0.0.1:9000"
            weight = 3

            [[backends]]
            name = "api-2"
            url = "http://10.0.0.2:9000"
            health = "/status"
            enabled = false
        "#;
        let config: ProxyConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.method(), Method::Weighted);
        assert_eq!(config.backends.len(), 2);
        assert!(config.backends[0].enabled);
        assert!(!config.backends[1].enabled);
        assert_eq!(config.backends[1].health, "/status");
        assert_eq!(config.timeouts.request_ms, 30_000);
    }
}
