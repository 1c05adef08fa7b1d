//! HTTP client for the rewards node API

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{Error, RemoteOperation, Result};
use crate::wallet::WalletIdentity;

use super::types::{
    ActivateRequest, ActivateResponse, NodeStatusResponse, PingRequest, PingResponse,
};
use super::{PingResult, RemoteService};

/// reqwest-backed `RemoteService`
pub struct HttpRemoteService {
    client: Client,
    base_url: String,
}

impl HttpRemoteService {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Message signed for activation
    fn activation_message(address: &str) -> String {
        format!(
            "Start node for {} at {}",
            address,
            Utc::now().timestamp_millis()
        )
    }
}

async fn decode<T: DeserializeOwned>(
    response: Response,
    address: &str,
    operation: RemoteOperation,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(200).collect();
        return Err(Error::remote(
            address,
            operation,
            format!("HTTP {}: {}", status, body.trim()),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| Error::remote(address, operation, format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn node_status(&self, address: &str) -> Result<bool> {
        let op = RemoteOperation::NodeStatus;
        debug!("Checking node status for {}", address);

        let response = self
            .client
            .get(self.url(&format!("/node/status/{}", address)))
            .send()
            .await
            .map_err(|e| Error::remote(address, op, format!("HTTP request failed: {}", e)))?;

        let status: NodeStatusResponse = decode(response, address, op).await?;
        Ok(status.is_running)
    }

    async fn activate(&self, identity: &WalletIdentity) -> Result<bool> {
        let op = RemoteOperation::Activate;
        let address = identity.address();

        let message = Self::activation_message(address);
        let signature = identity.sign_message(&message)?;
        let request = ActivateRequest {
            address: address.to_string(),
            message,
            signature,
        };

        debug!("Sending activation for {}", address);

        let response = self
            .client
            .post(self.url("/node/start"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::remote(address, op, format!("HTTP request failed: {}", e)))?;

        let result: ActivateResponse = decode(response, address, op).await?;
        Ok(result.success)
    }

    async fn ping(&self, address: &str) -> Result<PingResult> {
        let op = RemoteOperation::Ping;
        let request = PingRequest {
            address: address.to_string(),
        };

        let response = self
            .client
            .post(self.url("/node/ping"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::remote(address, op, format!("HTTP request failed: {}", e)))?;

        let result: PingResponse = decode(response, address, op).await?;
        Ok(PingResult {
            points: result.node_points,
        })
    }
}
