//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend identity and health paths
//! - Validate listener addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Malformed backend URLs are not errors: the pool skips those backends
//!   and starts with the rest, so they only produce warnings here
//! - Runs after defaults have been applied

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// Check a defaulted configuration.
///
/// Returns the warnings on success, or every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<Vec<String>, Vec<String>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.backends.is_empty() {
        errors.push("no backends configured".to_string());
    }

    for (i, backend) in config.backends.iter().enumerate() {
        if backend.name.is_empty() {
            errors.push(format!("backend #{} has no name", i + 1));
        }
        if !backend.health.starts_with('/') {
            errors.push(format!(
                "backend '{}' health check path must start with '/'",
                backend.name
            ));
        }
        if !is_valid_url(&backend.url) {
            warnings.push(format!(
                "backend '{}' has an invalid url '{}' and will be skipped",
                backend.name, backend.url
            ));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "invalid listener bind address '{}'",
            config.listener.bind_address
        ));
    }
    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "invalid admin bind address '{}'",
            config.admin.bind_address
        ));
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}

/// A usable backend base URL has a scheme and a host.
pub fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => url.has_host() && !url.scheme().is_empty(),
        Err(_) => false,
    }
}
