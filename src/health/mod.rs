//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic ticker
//!     → Sweep every backend whose backoff has elapsed
//!     → HTTP GET <base><health path>
//!     → Update state.rs
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     With exponential backoff between probes of a failing backend
//! ```
//!
//! # Design Decisions
//! - The health checker is the only writer of health and backoff state
//! - Responses from proxied requests never change health
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::{HealthCheckHandle, HealthChecker};
pub use state::{ProbeOutcome, Transition};
