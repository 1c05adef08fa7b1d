//! Wallet identity - an EVM address derived from a secp256k1 private key
//!
//! The address is `0x` + last 20 bytes of keccak256(uncompressed pubkey),
//! rendered with the EIP-55 mixed-case checksum.

use std::fmt;

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// A wallet loaded from the key file
#[derive(Clone)]
pub struct WalletIdentity {
    address: String,
    /// Key exactly as it was read (trimmed), kept for the removal ledger
    secret: Zeroizing<String>,
}

impl WalletIdentity {
    /// Derive an identity from a hex private key (with or without `0x`)
    pub fn from_secret(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let secret_key = parse_secret_key(trimmed)?;
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            address: address_from_public_key(&public_key),
            secret: Zeroizing::new(trimmed.to_string()),
        })
    }

    /// Checksummed `0x` address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Secret key as loaded. Only the removal ledger should need this.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `0x1234...abcd` form for log lines
    pub fn short_address(&self) -> String {
        short_address(&self.address)
    }

    /// EIP-191 `personal_sign` over `message`.
    /// Returns a `0x`-prefixed 65-byte hex signature (r || s || v, v in {27, 28}).
    pub fn sign_message(&self, message: &str) -> Result<String> {
        let secret_key = parse_secret_key(&self.secret)?;
        let hash = personal_message_hash(message.as_bytes());

        let secp = Secp256k1::signing_only();
        let digest = Message::from_digest_slice(&hash)
            .map_err(|e| Error::Internal(format!("Invalid message digest: {}", e)))?;
        let recoverable = secp.sign_ecdsa_recoverable(&digest, &secret_key);
        let (recovery_id, compact) = recoverable.serialize_compact();

        let mut signature = Vec::with_capacity(65);
        signature.extend_from_slice(&compact);
        signature.push((recovery_id.to_i32() % 2) as u8 + 27);

        Ok(format!("0x{}", hex::encode(signature)))
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .field("secret", &"***")
            .finish()
    }
}

/// Shorten an address for display
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Mask a secret for display, keeping only a few leading characters
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{}***", visible)
}

fn parse_secret_key(raw: &str) -> Result<SecretKey> {
    let hex_part = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    if hex_part.len() != 64 {
        return Err(Error::InvalidKey(format!(
            "expected 64 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = Zeroizing::new(
        hex::decode(hex_part).map_err(|e| Error::InvalidKey(format!("not valid hex: {}", e)))?,
    );

    SecretKey::from_slice(&bytes).map_err(|e| Error::InvalidKey(e.to_string()))
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut hash);
    hash
}

fn address_from_public_key(public_key: &PublicKey) -> String {
    // Skip the 0x04 prefix byte, hash the X,Y coordinates
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    to_checksum_address(&hash[12..])
}

/// EIP-55 mixed-case checksum encoding
fn to_checksum_address(addr_bytes: &[u8]) -> String {
    let lower = hex::encode(addr_bytes);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}
