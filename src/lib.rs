//! Wallet Pinger Library
//!
//! Keeps a set of wallets alive on a rewards node service: checks each
//! node's status, activates it when needed and pings it to accrue points.
//! Wallets that keep failing are dropped and written to a removal ledger.

pub mod cli;
pub mod config;
pub mod error;
pub mod processor;
pub mod remote;
pub mod scheduler;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use processor::WalletProcessor;
pub use scheduler::Scheduler;
