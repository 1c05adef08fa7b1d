//! Wire types for the rewards node API

use serde::{Deserialize, Serialize};

/// `GET /node/status/{address}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusResponse {
    #[serde(alias = "running")]
    pub is_running: bool,
}

/// `POST /node/start`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub address: String,
    /// Plain text that was signed
    pub message: String,
    /// EIP-191 signature of `message`
    pub signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateResponse {
    #[serde(default)]
    pub success: bool,
}

/// `POST /node/ping`
#[derive(Debug, Clone, Serialize)]
pub struct PingRequest {
    pub address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    /// Current point total, when the service reports one
    #[serde(default)]
    pub node_points: Option<u64>,
}
