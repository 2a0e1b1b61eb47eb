//! Backend health state machine.
//!
//! # States
//! - Healthy: backend receives traffic
//! - Unhealthy: backend excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: probe fails (transport error, timeout or non-2xx)
//! Unhealthy → Healthy: probe returns 2xx
//! ```
//!
//! Every failed probe advances the backend's backoff; every successful probe
//! resets it. A backend is not probed again until its backoff has elapsed
//! since the last check.

use std::time::Instant;

use crate::load_balancer::Backend;

/// Result of one health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx response.
    Success(u16),
    /// Any other response status.
    Status(u16),
    /// Transport failure or timeout.
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }
}

/// How a probe changed a backend's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    BecameHealthy,
    BecameUnhealthy,
}

/// Whether `backend` is due for a probe at `now`.
pub fn should_probe(backend: &Backend, now: Instant) -> bool {
    match backend.checked() {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= backend.backoff(),
    }
}

/// Record a probe result on `backend`.
pub fn apply_probe(backend: &Backend, outcome: &ProbeOutcome, now: Instant) -> Transition {
    let was_healthy = backend.is_healthy();
    backend.set_checked(now);

    if outcome.is_success() {
        backend.set_healthy(true);
        backend.reset_backoff();
        if was_healthy {
            Transition::Unchanged
        } else {
            Transition::BecameHealthy
        }
    } else {
        backend.set_healthy(false);
        backend.exp_backoff();
        if was_healthy {
            Transition::BecameUnhealthy
        } else {
            Transition::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn backend() -> Backend {
        Backend::new("a", Url::parse("http://127.0.0.1:9").unwrap(), "/health", 1, true)
    }

    #[test]
    fn test_failure_marks_unhealthy_and_backs_off() {
        let b = backend();
        let now = Instant::now();
        let t = apply_probe(&b, &ProbeOutcome::Status(500), now);

        assert_eq!(t, Transition::BecameUnhealthy);
        assert!(!b.is_healthy());
        assert_eq!(b.backoff(), Duration::from_secs(1));
        assert_eq!(b.checked(), Some(now));
    }

    #[test]
    fn test_skip_window_follows_backoff() {
        let b = backend();
        let now = Instant::now();
        assert!(should_probe(&b, now));

        apply_probe(&b, &ProbeOutcome::Failed("refused".into()), now);
        assert!(!should_probe(&b, now + Duration::from_millis(500)));
        assert!(should_probe(&b, now + Duration::from_secs(1)));
    }

    #[test]
    fn test_recovery_resets_backoff() {
        let b = backend();
        let now = Instant::now();
        apply_probe(&b, &ProbeOutcome::Status(503), now);
        apply_probe(&b, &ProbeOutcome::Status(503), now + Duration::from_secs(1));
        assert_eq!(b.backoff(), Duration::from_secs(2));

        let t = apply_probe(&b, &ProbeOutcome::Success(200), now + Duration::from_secs(3));
        assert_eq!(t, Transition::BecameHealthy);
        assert!(b.is_healthy());
        assert_eq!(b.backoff(), Duration::ZERO);
    }

    #[test]
    fn test_healthy_backend_is_probed_every_sweep() {
        let b = backend();
        let now = Instant::now();
        assert_eq!(apply_probe(&b, &ProbeOutcome::Success(204), now), Transition::Unchanged);
        assert!(should_probe(&b, now));
    }
}
