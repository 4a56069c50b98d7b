//! Spyglass CLI
//!
//! Terminal observer for long-running scan jobs. Attaches to a job's
//! progress stream and follows status, log lines and incremental results
//! until the job finishes, reconnecting across network interruptions.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spyglass")]
#[command(about = "Live progress observer for scan jobs", long_about = None)]
struct Cli {
    /// Scanner API base URL
    #[arg(
        long,
        env = "SPYGLASS_API_URL",
        default_value = "http://localhost:8000"
    )]
    api_url: String,

    /// Bearer credential attached to the stream handshake
    #[arg(long, env = "SPYGLASS_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spyglass_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
