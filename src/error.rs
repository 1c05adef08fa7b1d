//! Error types for the wallet pinger

use std::fmt;

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Remote call that failed, carried as context on remote errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    NodeStatus,
    Activate,
    Ping,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteOperation::NodeStatus => write!(f, "node status"),
            RemoteOperation::Activate => write!(f, "activate"),
            RemoteOperation::Ping => write!(f, "ping"),
        }
    }
}

/// Main error type for the wallet pinger
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Malformed key on line {line}: {reason}")]
    MalformedIdentity { line: usize, reason: String },

    // Remote service errors
    #[error("{operation} failed for {address}: {message}")]
    RemoteCall {
        address: String,
        operation: RemoteOperation,
        message: String,
    },

    #[error("{operation} timed out for {address} after {timeout_ms}ms")]
    RemoteTimeout {
        address: String,
        operation: RemoteOperation,
        timeout_ms: u64,
    },

    #[error("Node activation unsuccessful for {address}")]
    ActivationRejected { address: String },

    // Registry errors
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a remote call error with its context
    pub fn remote(
        address: impl Into<String>,
        operation: RemoteOperation,
        message: impl fmt::Display,
    ) -> Self {
        Error::RemoteCall {
            address: address.into(),
            operation,
            message: message.to_string(),
        }
    }

    /// Check if this error came from talking to the remote service.
    /// These count toward a wallet's retry budget.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteCall { .. } | Error::RemoteTimeout { .. } | Error::ActivationRejected { .. }
        )
    }

    /// Remote operation involved, if any
    pub fn operation(&self) -> Option<RemoteOperation> {
        match self {
            Error::RemoteCall { operation, .. } | Error::RemoteTimeout { operation, .. } => {
                Some(*operation)
            }
            Error::ActivationRejected { .. } => Some(RemoteOperation::Activate),
            _ => None,
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
