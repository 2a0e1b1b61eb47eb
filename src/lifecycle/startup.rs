//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Bind the proxy listener and start the server
//! - Wait for a signal, then shut down in order
//!
//! # Design Decisions
//! - Fail fast: a listener that cannot bind is fatal
//! - The server owns the health checker and admin listener

use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics::init_metrics;

/// Run the proxy until SIGINT or SIGTERM, then drain and return.
pub async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Invalid metrics address, exporter disabled"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            task.await??;
        }
        result = &mut task => {
            result??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
