//! Wallet Pinger - keeps rewards nodes alive for a list of wallets
//!
//! # WARNING
//! - data.txt holds raw private keys. Keep it readable by you only.
//! - removed_wallets.csv also contains the keys of dropped wallets.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

// Use the library crate
use wallet_pinger::cli::commands::{self, RunOptions};
use wallet_pinger::config::Config;

/// Wallet Pinger - periodic status checks, activation and pings
#[derive(Parser)]
#[command(name = "pinger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "pinger.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start processing wallets
    Run {
        /// Stop after this many passes instead of running forever
        #[arg(long)]
        passes: Option<u32>,

        /// Seed for the delay between wallets
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Load the key file and show derived addresses (no network)
    Check,

    /// Show wallets dropped after repeated failures
    Removed {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wallet_pinger=info")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Run { passes, seed } => commands::run(&config, RunOptions { passes, seed })
            .await
            .map(|report| info!("Finished: {} passes, {}", report.passes, report.reason)),
        Commands::Check => commands::check(&config),
        Commands::Removed { limit } => commands::removed(&config, limit),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
