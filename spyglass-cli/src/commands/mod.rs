//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod watch;

pub use watch::WatchArgs;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Follow a job live until it finishes
    Watch(WatchArgs),
    /// Print a one-shot status snapshot for a job
    Status {
        /// Job ID
        id: Uuid,
    },
    /// Print the current log tail for a job
    Logs {
        /// Job ID
        id: Uuid,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Watch(args) => watch::watch_job(args, config).await,
        Commands::Status { id } => watch::print_status(id, config).await,
        Commands::Logs { id } => watch::print_logs(id, config).await,
    }
}
