//! Broadcast and notification clients.

#![cfg_attr(not(feature = "http-executor"), allow(dead_code))]

use async_trait::async_trait;
use serde::Serialize;

use super::config::{BroadcastConfig, NotifyConfig};
use super::http;
use crate::builder::SignedTransaction;
use crate::services::{Broadcaster, Notifier};
use crate::{PinkitError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BroadcastRequest<'a> {
    chain: &'a str,
    net: &'a str,
    raw_tx: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotifyRequest {
    tx_hex: String,
}

/// HTTP implementation of the [`Broadcaster`] capability.
pub struct BroadcastClient {
    config: BroadcastConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl BroadcastClient {
    /// Create a new broadcast client.
    #[cfg(feature = "http-executor")]
    pub fn new(config: BroadcastConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Create a new broadcast client (stub when the feature is disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: BroadcastConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// The client configuration.
    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    #[cfg(feature = "http-executor")]
    async fn post_broadcast(&self, raw_tx: String) -> Result<String> {
        const OPERATION: &str = "broadcast";
        let url = http::join_url(&self.config.base_url, "tx/broadcast");
        let body = BroadcastRequest {
            chain: &self.config.chain,
            net: self.config.network.as_str(),
            raw_tx,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::map_reqwest_error(OPERATION, e))?;
        let response = http::check_status(OPERATION, response).await?;
        let envelope: http::Envelope<String> = response
            .json()
            .await
            .map_err(|e| PinkitError::network(OPERATION, format!("invalid response: {e}")))?;
        if let Some(message) = envelope.error.filter(|m| !m.is_empty()) {
            return Err(PinkitError::network(OPERATION, message));
        }
        envelope
            .data
            .filter(|txid| !txid.is_empty())
            .ok_or_else(|| PinkitError::network(OPERATION, "no txid in response"))
    }

    #[cfg(not(feature = "http-executor"))]
    async fn post_broadcast(&self, _raw_tx: String) -> Result<String> {
        Err(PinkitError::Unimplemented("broadcast client"))
    }
}

#[async_trait]
impl Broadcaster for BroadcastClient {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<String> {
        self.post_broadcast(tx.raw_hex()).await
    }
}

/// HTTP implementation of the best-effort [`Notifier`] capability.
pub struct NotifyClient {
    config: NotifyConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl NotifyClient {
    /// Create a new notifier client.
    #[cfg(feature = "http-executor")]
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Create a new notifier client (stub when the feature is disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: NotifyConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// The client configuration.
    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }
}

#[async_trait]
impl Notifier for NotifyClient {
    #[cfg(feature = "http-executor")]
    async fn notify(&self, raw_tx_hex: &str) -> Result<()> {
        const OPERATION: &str = "notify";
        let url = http::join_url(&self.config.base_url, "tx/notify");
        let body = NotifyRequest {
            tx_hex: raw_tx_hex.to_string(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::map_reqwest_error(OPERATION, e))?;
        http::check_status(OPERATION, response).await?;
        Ok(())
    }

    #[cfg(not(feature = "http-executor"))]
    async fn notify(&self, _raw_tx_hex: &str) -> Result<()> {
        Err(PinkitError::Unimplemented("notify client"))
    }
}
