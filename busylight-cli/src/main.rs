mod commands;
mod light_client;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use busylight_core::config::{Config, DEFAULT_CONFIG_FILE};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "busylight")]
#[command(about = "Keep a presence light in sync with your calendar")]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass (the default)
    Run,
    /// Show the regime, light state, and live events without acting
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(&cli.config)?;
    let tz = config.tz()?;

    // One clock read per invocation; every decision below sees the same instant.
    let now = Utc::now().with_timezone(&tz);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::run(&config, now).await,
        Commands::Status => commands::status::run(&config, now).await,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over the -v flags when set
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
