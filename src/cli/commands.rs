//! CLI command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::processor::{ProcessorConfig, WalletProcessor};
use crate::remote::HttpRemoteService;
use crate::scheduler::{RunReport, Scheduler, SchedulerConfig};
use crate::wallet::identity::{mask_secret, short_address};
use crate::wallet::{key_source, CsvLedger, WalletRegistry};

/// Options for the `run` command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many passes
    pub passes: Option<u32>,
    /// Seed for the inter-wallet delays
    pub seed: Option<u64>,
}

/// Load keys and keep pinging until no wallet is left or Ctrl-C
pub async fn run(config: &Config, options: RunOptions) -> Result<RunReport> {
    info!("Starting wallet pinger...");

    let identities = key_source::load_file(&config.keys.path)?;
    info!("Successfully loaded {} wallets", identities.len());

    let ledger = CsvLedger::new(&config.ledger.path);
    let registry = WalletRegistry::with_identities(identities, Box::new(ledger));
    info!("Removed wallets will be recorded in {}", config.ledger.path);

    let remote = HttpRemoteService::from_config(&config.remote)
        .context("Failed to create remote service client")?;
    let processor = WalletProcessor::new(Arc::new(remote), ProcessorConfig::from(config));

    let scheduler_config = SchedulerConfig {
        max_passes: options.passes,
        ..SchedulerConfig::from(config)
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, finishing current wallet...");
            signal_token.cancel();
        }
    });

    let mut scheduler = Scheduler::new(registry, processor, scheduler_config, shutdown);
    if let Some(seed) = options.seed {
        scheduler = scheduler.with_seed(seed);
    }

    let report = scheduler.run().await;
    info!(
        "Wallet pinger stopped after {} passes: {}",
        report.passes, report.reason
    );

    Ok(report)
}

/// Load keys and print the derived addresses. No network access.
pub fn check(config: &Config) -> Result<()> {
    let identities = key_source::load_file(&config.keys.path)?;

    println!("\n=== Wallets in {} ===\n", config.keys.path);
    println!("{:<4} {:<44} {}", "#", "ADDRESS", "KEY");
    for (i, identity) in identities.iter().enumerate() {
        println!(
            "{:<4} {:<44} {}",
            i + 1,
            identity.address(),
            mask_secret(identity.secret())
        );
    }
    println!("\n{} valid wallets", identities.len());

    Ok(())
}

/// Show the most recent removal records
pub fn removed(config: &Config, limit: usize) -> Result<()> {
    let ledger = CsvLedger::new(&config.ledger.path);
    let records = ledger
        .read_all()
        .with_context(|| format!("Failed to read {}", config.ledger.path))?;

    if records.is_empty() {
        println!("No removed wallets recorded in {}", config.ledger.path);
        return Ok(());
    }

    println!("\n=== Removed wallets ({} total) ===\n", records.len());
    for record in records.iter().rev().take(limit) {
        println!(
            "{}  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            short_address(&record.address),
            record.reason
        );
    }

    if records.len() > limit {
        warn!("{} older records not shown", records.len() - limit);
    }

    Ok(())
}

/// Show configuration (masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
