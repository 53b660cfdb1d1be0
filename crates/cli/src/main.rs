//! ARIA CLI: the main entry point.
//!
//! Commands:
//! - `ask`     : one reasoning call, optionally across every backend
//! - `select`  : show which backend a query would go to, and why
//! - `daemon`  : sensors, context monitor and autonomous mode until Ctrl-C
//! - `status`  : configuration summary
//! - `config`  : print the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod notify;
mod runtime;

#[derive(Parser)]
#[command(
    name = "aria",
    about = "ARIA: a context-aware personal assistant core",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.aria/config.toml
    #[arg(long, global = true, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant a question
    Ask {
        query: String,

        /// Ask every backend and merge the answers
        #[arg(long)]
        consensus: bool,
    },

    /// Show the backend a query would be routed to
    Select { query: String },

    /// Run sensors, context monitoring and autonomous mode until Ctrl-C
    Daemon {
        /// Feed synthetic motion samples into the sensor pipeline
        #[arg(long)]
        demo: bool,
    },

    /// Show configuration and backend summary
    Status,

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask { query, consensus } => {
            commands::ask::run(config_path, query, consensus).await?
        }
        Commands::Select { query } => commands::select::run(config_path, query)?,
        Commands::Daemon { demo } => commands::daemon::run(config_path, demo).await?,
        Commands::Status => commands::status::run(config_path)?,
        Commands::Config => commands::config_cmd::run(),
    }

    Ok(())
}
