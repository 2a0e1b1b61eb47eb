//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → schema.rs (apply Defaults, collect warnings)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by reference to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Defaults live in one `Defaults` value, not scattered constants
//! - Defaulting produces warnings, validation produces errors

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, LoadedConfig};
pub use schema::AdminConfig;
pub use schema::BackendConfig;
pub use schema::Defaults;
pub use schema::HealthCheckConfig;
pub use schema::LifecycleConfig;
pub use schema::ListenerConfig;
pub use schema::LoadBalancerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ProxyConfig;
pub use schema::TimeoutConfig;
