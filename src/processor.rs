//! Wallet processor - one attempt for one wallet
//!
//! ```text
//! Pending → Processing → CheckingStatus → (Activating → Activated)? → Active
//!                                      ↘ any failure ↘ Error (+1 error, maybe removal)
//! ```
//!
//! Every failure in an attempt counts once toward the wallet's retry budget,
//! whichever call it came from. Reaching the budget removes the wallet.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, RemoteOperation, Result};
use crate::remote::RemoteService;
use crate::wallet::{WalletIdentity, WalletRegistry, WalletState};

/// Processor settings
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Consecutive failures before removal
    pub max_retries: u32,
    /// Wait after activation before the first ping
    pub settle_delay: Duration,
    /// Bound on each remote call
    pub call_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            settle_delay: Duration::from_secs(5),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for ProcessorConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_retries: config.retry.max_retries,
            settle_delay: config.schedule.settle_delay(),
            call_timeout: config.remote.timeout(),
        }
    }
}

/// Drives single wallets through status check, activation and ping
pub struct WalletProcessor {
    remote: Arc<dyn RemoteService>,
    config: ProcessorConfig,
}

impl WalletProcessor {
    pub fn new(remote: Arc<dyn RemoteService>, config: ProcessorConfig) -> Self {
        Self { remote, config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run one attempt for `address`. Returns true on a successful ping.
    ///
    /// Never fails: errors end up in the wallet's status record and error
    /// counter, and may remove the wallet from the registry.
    pub async fn process(&self, registry: &mut WalletRegistry, address: &str) -> bool {
        let identity = match registry.identity(address) {
            Ok(identity) => identity.clone(),
            Err(e) => {
                warn!("Cannot process wallet: {}", e);
                return false;
            }
        };

        match self.attempt(registry, &identity).await {
            Ok(points) => {
                info!(
                    "Ping successful for wallet {}. Current points: {}",
                    identity.short_address(),
                    points
                );
                true
            }
            Err(e) => {
                self.handle_failure(registry, &identity, &e);
                false
            }
        }
    }

    async fn attempt(&self, registry: &mut WalletRegistry, identity: &WalletIdentity) -> Result<u64> {
        let address = identity.address();
        set_state(registry, address, WalletState::Processing)?;

        info!("Checking status for wallet {}", identity.short_address());
        set_state(registry, address, WalletState::CheckingStatus)?;
        let running = self
            .bounded(address, RemoteOperation::NodeStatus, self.remote.node_status(address))
            .await?;

        if !running {
            info!("Activating wallet {}", identity.short_address());
            set_state(registry, address, WalletState::Activating)?;

            let activated = self
                .bounded(address, RemoteOperation::Activate, self.remote.activate(identity))
                .await?;
            if !activated {
                return Err(Error::ActivationRejected {
                    address: address.to_string(),
                });
            }

            info!("Successfully activated wallet {}", identity.short_address());
            set_state(registry, address, WalletState::Activated)?;
            tokio::time::sleep(self.config.settle_delay).await;
        } else {
            info!("Wallet {} is already active", identity.short_address());
        }

        info!("Pinging wallet {}", identity.short_address());
        let ping = self
            .bounded(address, RemoteOperation::Ping, self.remote.ping(address))
            .await?;

        let status = registry.status_mut(address)?;
        status.mark_pinged(ping.points, Utc::now());
        let points = status.points;
        registry.record_success(address)?;

        Ok(points)
    }

    fn handle_failure(&self, registry: &mut WalletRegistry, identity: &WalletIdentity, err: &Error) {
        let address = identity.address();
        let message = err.to_string();
        error!("Error processing wallet {}: {}", identity.short_address(), message);

        if let Ok(status) = registry.status_mut(address) {
            status.mark_failed(message.clone());
        }

        let count = match registry.record_failure(address) {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not count failure: {}", e);
                return;
            }
        };

        if count >= self.config.max_retries {
            if let Err(e) = registry.remove(address, &message) {
                warn!("Could not remove wallet {}: {}", identity.short_address(), e);
            }
        } else {
            warn!(
                "Wallet {} failed {}/{} times",
                identity.short_address(),
                count,
                self.config.max_retries
            );
        }
    }

    /// Apply the per-call timeout
    async fn bounded<T>(
        &self,
        address: &str,
        operation: RemoteOperation,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteTimeout {
                address: address.to_string(),
                operation,
                timeout_ms: self.config.call_timeout.as_millis() as u64,
            }),
        }
    }
}

fn set_state(registry: &mut WalletRegistry, address: &str, state: WalletState) -> Result<()> {
    registry.status_mut(address)?.state = state;
    Ok(())
}
