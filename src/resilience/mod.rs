//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → retries.rs (budget = available backends at request start)
//!     → timeouts.rs (enforce per-attempt deadline, classify failure)
//!     → On transport failure: next attempt against another backend
//!
//! Health probe failure:
//!     → backoff.rs (grow re-probe cooldown, 1s doubling to 60s)
//! ```
//!
//! # Design Decisions
//! - Only transport failures and timeouts are retried; HTTP error statuses are not
//! - No sleep between attempts: the next attempt goes to a different backend
//! - Backoff throttles health probes, never client requests

pub mod backoff;
pub mod retries;
pub mod timeouts;
