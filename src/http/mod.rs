//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID and tracing layers)
//!     → dispatcher.rs (budget, backend selection, retry loop)
//!     → request.rs (forwarding headers, shared body)
//!     → client.rs (upstream HTTP/1.1 client)
//!     → response.rs (relay backend response, or 503)
//!     → Send to client
//! ```

pub mod client;
pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{Outcome, ProxyDispatcher};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
