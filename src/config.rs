//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Where the secret keys are read from
#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    /// Newline-delimited private keys
    #[serde(default = "default_keys_path")]
    pub path: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            path: default_keys_path(),
        }
    }
}

/// Removal ledger location
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Append-only CSV of removed wallets
    #[serde(default = "default_ledger_path")]
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Upper bound for every single remote call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Lower bound of the pause between two wallets (inclusive)
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Upper bound of the pause between two wallets (inclusive)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Pause between two full passes
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    /// Pause after a successful activation, before pinging
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            restart_delay_secs: default_restart_delay_secs(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ScheduleConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Consecutive failures before a wallet is dropped for good
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

// Default value functions
fn default_keys_path() -> String {
    "data.txt".to_string()
}

fn default_ledger_path() -> String {
    "removed_wallets.csv".to_string()
}

fn default_base_url() -> String {
    std::env::var("PINGER_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into())
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_min_delay_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_restart_delay_secs() -> u64 {
    5 * 60 * 60
}

fn default_settle_delay_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    3
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("keys.path", default_keys_path())?
            .set_default("ledger.path", default_ledger_path())?
            .set_default("remote.base_url", default_base_url())?
            .set_default("remote.timeout_ms", default_timeout_ms() as i64)?
            .set_default("retry.max_retries", default_max_retries() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix PINGER_)
            .add_source(
                config::Environment::with_prefix("PINGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.keys.path.trim().is_empty() {
            anyhow::bail!("keys.path must not be empty");
        }

        if self.ledger.path.trim().is_empty() {
            anyhow::bail!("ledger.path must not be empty");
        }

        if self.remote.base_url.trim().is_empty() {
            anyhow::bail!("remote.base_url must not be empty");
        }

        if self.remote.timeout_ms == 0 {
            anyhow::bail!("remote.timeout_ms must be positive");
        }

        if self.schedule.min_delay_ms > self.schedule.max_delay_ms {
            anyhow::bail!(
                "schedule.min_delay_ms ({}) cannot exceed schedule.max_delay_ms ({})",
                self.schedule.min_delay_ms,
                self.schedule.max_delay_ms
            );
        }

        if self.retry.max_retries == 0 {
            anyhow::bail!("retry.max_retries must be at least 1");
        }

        if self.schedule.restart_delay_secs == 0 {
            tracing::warn!("schedule.restart_delay_secs is 0 - passes will run back to back");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Keys:
    path: {}
  Ledger:
    path: {}
  Remote:
    base_url: {}
    timeout: {}ms
  Schedule:
    wallet_delay: {}-{}ms
    restart_delay: {}s
    settle_delay: {}ms
  Retry:
    max_retries: {}
"#,
            self.keys.path,
            self.ledger.path,
            mask_url(&self.remote.base_url),
            self.remote.timeout_ms,
            self.schedule.min_delay_ms,
            self.schedule.max_delay_ms,
            self.schedule.restart_delay_secs,
            self.schedule.settle_delay_ms,
            self.retry.max_retries,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys: KeysConfig::default(),
            ledger: LedgerConfig::default(),
            remote: RemoteConfig::default(),
            schedule: ScheduleConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.keys.path, "data.txt");
        assert_eq!(config.ledger.path, "removed_wallets.csv");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.schedule.restart_delay(), Duration::from_secs(18000));
        assert_eq!(config.schedule.settle_delay(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pinger.toml");
        std::fs::write(
            &path,
            r#"
[keys]
path = "keys.txt"

[schedule]
min_delay_ms = 100
max_delay_ms = 200

[retry]
max_retries = 5
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.path, "keys.txt");
        assert_eq!(config.schedule.min_delay_ms, 100);
        assert_eq!(config.schedule.max_delay_ms, 200);
        assert_eq!(config.schedule.settle_delay_ms, 5000);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.ledger.path, "removed_wallets.csv");
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut config = Config::default();
        config.schedule.min_delay_ms = 10;
        config.schedule.max_delay_ms = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://api.example.com?key=secret"),
            "https://api.example.com?***"
        );
        assert_eq!(
            mask_url("https://api.example.com"),
            "https://api.example.com"
        );
    }
}
