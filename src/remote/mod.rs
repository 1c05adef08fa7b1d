//! Rewards node service
//!
//! The pinger only needs three calls: node status, activation and ping.
//! `RemoteService` is the seam; `HttpRemoteService` is the real client.

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use crate::wallet::WalletIdentity;

pub use http::HttpRemoteService;

/// Result of a ping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingResult {
    pub points: Option<u64>,
}

/// Operations the rewards service exposes for a wallet
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Whether the wallet's node is currently running
    async fn node_status(&self, address: &str) -> Result<bool>;

    /// Start the node for a wallet. `Ok(false)` means the service refused.
    async fn activate(&self, identity: &WalletIdentity) -> Result<bool>;

    /// Prove liveness and fetch the current point total
    async fn ping(&self, address: &str) -> Result<PingResult>;
}
