//! Core types for wallet tracking
//!
//! Defines per-wallet status records and the removal audit record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where a wallet is in its current processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletState {
    /// Registered, not processed yet
    Pending,
    Processing,
    CheckingStatus,
    Activating,
    Activated,
    /// Last ping succeeded
    Active,
    /// Last attempt failed
    Error,
}

impl std::fmt::Display for WalletState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletState::Pending => write!(f, "Pending"),
            WalletState::Processing => write!(f, "Processing"),
            WalletState::CheckingStatus => write!(f, "Checking Status"),
            WalletState::Activating => write!(f, "Activating"),
            WalletState::Activated => write!(f, "Activated"),
            WalletState::Active => write!(f, "Active"),
            WalletState::Error => write!(f, "Error"),
        }
    }
}

/// Status record kept for every live wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub state: WalletState,
    pub last_ping: Option<DateTime<Utc>>,
    /// Last point total reported by the service
    pub points: u64,
    pub last_error: Option<String>,
}

impl Default for WalletStatus {
    fn default() -> Self {
        Self {
            state: WalletState::Pending,
            last_ping: None,
            points: 0,
            last_error: None,
        }
    }
}

impl WalletStatus {
    /// Apply a successful ping
    pub fn mark_pinged(&mut self, points: Option<u64>, at: DateTime<Utc>) {
        self.last_ping = Some(at);
        if let Some(points) = points {
            self.points = points;
        }
        self.state = WalletState::Active;
        self.last_error = None;
    }

    /// Apply a failed attempt
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.state = WalletState::Error;
        self.last_error = Some(message.into());
    }
}

/// Audit record for a wallet that was dropped after too many failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalRecord {
    pub address: String,
    pub secret_key: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl RemovalRecord {
    pub fn new(
        address: impl Into<String>,
        secret_key: impl Into<String>,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            address: address.into(),
            secret_key: secret_key.into(),
            // One record per line in the ledger
            reason: flatten_line_breaks(&reason.into()),
            timestamp,
        }
    }

    /// `address,secretKey,reason,timestamp`
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.address,
            self.secret_key,
            self.reason,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    /// Parse a ledger line. The reason may itself contain commas.
    pub fn from_csv_line(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let malformed = || Error::Deserialization(format!("Malformed removal record: {}", line));

        let (address, rest) = line.split_once(',').ok_or_else(malformed)?;
        let (secret_key, rest) = rest.split_once(',').ok_or_else(malformed)?;
        let (reason, timestamp) = rest.rsplit_once(',').ok_or_else(malformed)?;

        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| Error::Deserialization(format!("Bad removal timestamp {}: {}", timestamp, e)))?
            .with_timezone(&Utc);

        Ok(Self {
            address: address.to_string(),
            secret_key: secret_key.to_string(),
            reason: reason.to_string(),
            timestamp,
        })
    }
}

fn flatten_line_breaks(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Aggregate view of the registry, logged after every pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySummary {
    pub total: usize,
    pub active: usize,
    pub errored: usize,
    pub pending: usize,
    pub total_points: u64,
}

impl std::fmt::Display for RegistrySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} wallets ({} active, {} error, {} pending), {} points total",
            self.total, self.active, self.errored, self.pending, self.total_points
        )
    }
}
