use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxymity-ctl")]
#[command(about = "Management CLI for the proxymity admin endpoints", long_about = None)]
struct Cli {
    /// Base URL of the admin listener
    #[arg(short, long, default_value = "http://localhost:9090")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the proxy process is up
    Health,
    /// List backend health and connection counts
    Status,
    /// Show the resolved configuration
    Config,
    /// Show traffic, latency and error counters
    Metrics,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/health",
            Commands::Status => "/status",
            Commands::Config => "/config",
            Commands::Metrics => "/metrics",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    // /status answers 503 with a full report when every backend is down
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Error: admin endpoint returned status {}", status);
    }
    Ok(())
}
