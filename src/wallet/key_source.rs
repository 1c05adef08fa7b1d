//! Key file loading
//!
//! One private key per line. Blank lines are ignored, unparseable lines are
//! logged and skipped. Loading fails only when nothing usable remains.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};

use super::identity::{mask_secret, WalletIdentity};

/// Parse raw key file content into wallet identities
pub fn load(raw: &str) -> Result<Vec<WalletIdentity>> {
    let mut identities = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(idx + 1, line) {
            Ok(identity) => identities.push(identity),
            Err(e) => warn!("Skipping key {}: {}", mask_secret(line.trim()), e),
        }
    }

    if identities.is_empty() {
        return Err(Error::Config("No valid private keys found".to_string()));
    }

    info!("Parsed {} wallet keys", identities.len());
    Ok(identities)
}

/// Read and parse a key file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<WalletIdentity>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    load(&raw).map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("{} in {}", msg, path.display())),
        other => other,
    })
}

fn parse_line(line: usize, raw: &str) -> Result<WalletIdentity> {
    WalletIdentity::from_secret(raw).map_err(|e| Error::MalformedIdentity {
        line,
        reason: match e {
            Error::InvalidKey(reason) => reason,
            other => other.to_string(),
        },
    })
}
