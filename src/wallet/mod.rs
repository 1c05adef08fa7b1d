//! Wallet management module
//!
//! Provides the wallet side of the pinger:
//! - Key loading (data.txt, one private key per line)
//! - Address derivation and message signing
//! - Registry of live wallets with status and error tracking
//! - Removal ledger (removed_wallets.csv)
//!
//! # Architecture
//!
//! ```text
//! key_source → WalletRegistry → RemovalLedger
//!                   ↑
//!            WalletProcessor (crate::processor)
//! ```

pub mod identity;
pub mod key_source;
pub mod ledger;
pub mod registry;
pub mod types;

pub use identity::WalletIdentity;
pub use ledger::{CsvLedger, MemoryLedger, RemovalLedger};
pub use registry::WalletRegistry;
pub use types::{RegistrySummary, RemovalRecord, WalletState, WalletStatus};
