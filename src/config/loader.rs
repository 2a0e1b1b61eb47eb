//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Defaults, ProxyConfig};
use crate::config::validation::validate_config;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// A validated configuration and the warnings raised while resolving it.
///
/// Warnings are returned rather than logged so they can be emitted once the
/// configured logger is installed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ProxyConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!(warning = %warning, "Configuration warning");
        }
    }
}

/// Parse, default and validate configuration text.
///
/// Warnings never fail the load; validation errors are all reported together.
pub fn parse_config(content: &str, defaults: &Defaults) -> Result<LoadedConfig, ConfigError> {
    let mut config: ProxyConfig = toml::from_str(content)?;

    let mut warnings = config.apply_defaults(defaults);
    warnings.extend(validate_config(&config).map_err(ConfigError::Validation)?);

    Ok(LoadedConfig { config, warnings })
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path, defaults: &Defaults) -> Result<LoadedConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, defaults)
}
