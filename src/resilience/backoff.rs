//! Exponential backoff for health re-probing.

use std::time::Duration;

/// First step of the backoff sequence.
pub const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound of the backoff sequence.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Advance a backoff one step: `0 → 1s → 2s → 4s → … → 60s`.
///
/// Once the cap is reached the value stays there.
pub fn next_backoff(current: Duration) -> Duration {
    if current.is_zero() {
        return BASE_BACKOFF;
    }
    if current >= MAX_BACKOFF {
        return current;
    }
    current.saturating_mul(2).min(MAX_BACKOFF)
}
