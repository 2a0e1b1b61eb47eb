//! Proxymity reverse proxy.
//!
//! ```text
//!     Client ──▶ proxy listener ──▶ dispatcher ──▶ load balancer ──▶ Backend
//!                                       │                 ▲
//!                                       │ retry on        │ health/backoff
//!                                       ▼ transport error │
//!                                  next backend      health checker
//!
//!     Operator ──▶ admin listener (/health /status /config /metrics)
//! ```

use std::path::PathBuf;

use clap::Parser;

use proxymity::config::{load_config, Defaults};
use proxymity::lifecycle::startup;
use proxymity::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "proxymity")]
#[command(about = "HTTP reverse proxy with load balancing and health checks", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config, &Defaults::default())?;
    init_logging(&loaded.config.observability);
    loaded.log_warnings();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        bind_address = %loaded.config.listener.bind_address,
        method = %loaded.config.method(),
        backends = loaded.config.backends.len(),
        "proxymity starting"
    );

    startup::run(loaded.config).await
}
