//! Wallet registry - the authoritative set of live wallets
//!
//! Wallets keep their load order in `order`; everything else is keyed by
//! address in `entries`, so the list and the per-wallet state cannot drift
//! apart. Removal writes through to the removal ledger.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{Error, Result};

use super::identity::WalletIdentity;
use super::ledger::RemovalLedger;
use super::types::{RegistrySummary, RemovalRecord, WalletState, WalletStatus};

struct Entry {
    identity: WalletIdentity,
    status: WalletStatus,
    errors: u32,
}

/// Live wallets plus their status records and error counters
pub struct WalletRegistry {
    order: Vec<String>,
    entries: HashMap<String, Entry>,
    ledger: Box<dyn RemovalLedger>,
}

impl WalletRegistry {
    pub fn new(ledger: Box<dyn RemovalLedger>) -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
            ledger,
        }
    }

    /// Build a registry from loaded identities
    pub fn with_identities(
        identities: impl IntoIterator<Item = WalletIdentity>,
        ledger: Box<dyn RemovalLedger>,
    ) -> Self {
        let mut registry = Self::new(ledger);
        for identity in identities {
            registry.register(identity);
        }
        registry
    }

    /// Add a wallet with a fresh Pending status and a zero error count.
    ///
    /// A second identity for an address already present replaces the stored
    /// key and keeps the original list position.
    pub fn register(&mut self, identity: WalletIdentity) {
        let address = identity.address().to_string();

        if let Some(entry) = self.entries.get_mut(&address) {
            warn!("Duplicate key for wallet {}, keeping the last one", identity.short_address());
            entry.identity = identity;
            entry.status = WalletStatus::default();
            entry.errors = 0;
            return;
        }

        self.order.push(address.clone());
        self.entries.insert(
            address,
            Entry {
                identity,
                status: WalletStatus::default(),
                errors: 0,
            },
        );
    }

    pub fn active_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    /// Wallet at a list position, read against the current list
    pub fn wallet_at(&self, index: usize) -> Option<&WalletIdentity> {
        self.order
            .get(index)
            .and_then(|address| self.entries.get(address))
            .map(|entry| &entry.identity)
    }

    /// Addresses in processing order
    pub fn addresses(&self) -> &[String] {
        &self.order
    }

    pub fn identity(&self, address: &str) -> Result<&WalletIdentity> {
        self.entry(address).map(|entry| &entry.identity)
    }

    pub fn status(&self, address: &str) -> Result<&WalletStatus> {
        self.entry(address).map(|entry| &entry.status)
    }

    pub fn status_mut(&mut self, address: &str) -> Result<&mut WalletStatus> {
        self.entry_mut(address).map(|entry| &mut entry.status)
    }

    pub fn error_count(&self, address: &str) -> Result<u32> {
        self.entry(address).map(|entry| entry.errors)
    }

    /// Reset the error counter after a successful attempt
    pub fn record_success(&mut self, address: &str) -> Result<()> {
        self.entry_mut(address)?.errors = 0;
        Ok(())
    }

    /// Count one failed attempt, returning the new consecutive failure count
    pub fn record_failure(&mut self, address: &str) -> Result<u32> {
        let entry = self.entry_mut(address)?;
        entry.errors += 1;
        Ok(entry.errors)
    }

    /// Drop a wallet for good and append its removal record.
    ///
    /// The wallet is gone from the registry even if the ledger write fails;
    /// that failure is only logged.
    pub fn remove(&mut self, address: &str, reason: &str) -> Result<RemovalRecord> {
        let entry = self
            .entries
            .remove(address)
            .ok_or_else(|| Error::WalletNotFound(address.to_string()))?;
        self.order.retain(|a| a != address);

        let record = RemovalRecord::new(
            address,
            entry.identity.secret(),
            reason,
            Utc::now(),
        );

        if let Err(e) = self.ledger.append(&record) {
            error!("Error saving removed wallet {}: {}", entry.identity.short_address(), e);
        }

        info!(
            "Removed wallet {} due to: {} ({} remaining)",
            entry.identity.short_address(),
            record.reason,
            self.order.len()
        );

        Ok(record)
    }

    /// Counts per state and total points
    pub fn summary(&self) -> RegistrySummary {
        let mut summary = RegistrySummary {
            total: self.order.len(),
            ..Default::default()
        };

        for entry in self.entries.values() {
            match entry.status.state {
                WalletState::Active => summary.active += 1,
                WalletState::Error => summary.errored += 1,
                WalletState::Pending => summary.pending += 1,
                _ => {}
            }
            summary.total_points = summary.total_points.saturating_add(entry.status.points);
        }

        summary
    }

    fn entry(&self, address: &str) -> Result<&Entry> {
        self.entries
            .get(address)
            .ok_or_else(|| Error::WalletNotFound(address.to_string()))
    }

    fn entry_mut(&mut self, address: &str) -> Result<&mut Entry> {
        self.entries
            .get_mut(address)
            .ok_or_else(|| Error::WalletNotFound(address.to_string()))
    }
}
