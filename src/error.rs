//! Error types shared by the load balancer and the dispatcher.

use thiserror::Error;

/// Failures that can end a backend selection or a forwarding attempt.
///
/// HTTP error statuses returned by a backend are not errors here: they are
/// responses and travel back to the caller unchanged (see
/// [`crate::http::dispatcher::Outcome`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// The pool is empty, or every backend is disabled or unhealthy.
    #[error("no backends available")]
    NoBackendsAvailable,

    /// Weighted selection found a total weight of zero across available backends.
    #[error("total weight is zero")]
    ZeroWeight,

    /// Connect, read or write failure reaching a backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend did not answer within the configured deadline.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl ProxyError {
    /// Stable category name used in error responses and metric labels.
    pub fn category(&self) -> &'static str {
        match self {
            ProxyError::NoBackendsAvailable => "no_backends_available",
            ProxyError::ZeroWeight => "zero_weight",
            ProxyError::Transport(_) => "transport_error",
            ProxyError::Timeout(_) => "timeout",
        }
    }

    /// Whether another backend should be tried after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProxyError::Transport(_) | ProxyError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(ProxyError::Transport("refused".into()).is_retryable());
        assert!(ProxyError::Timeout("3s".into()).is_retryable());
        assert!(!ProxyError::NoBackendsAvailable.is_retryable());
        assert!(!ProxyError::ZeroWeight.is_retryable());
    }

    #[test]
    fn display_carries_underlying_text() {
        let err = ProxyError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(err.category(), "transport_error");
    }

    #[test]
    fn categories_are_distinct() {
        assert_eq!(ProxyError::NoBackendsAvailable.category(), "no_backends_available");
        assert_eq!(ProxyError::ZeroWeight.category(), "zero_weight");
        assert_eq!(ProxyError::Timeout(String::new()).category(), "timeout");
    }
}
