//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (aggregate counters + metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Admin `/metrics` (JSON snapshot)
//!     → Prometheus scrape (optional exporter)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows from the ingress layer to every backend attempt
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
