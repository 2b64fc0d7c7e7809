//! Fee-sponsoring assist service client.
//!
//! Three endpoints drive the assisted flow: `address-init` grants a
//! fresh spendable output, `pre` adds fee-covering inputs to an
//! unsigned transaction, `commit` finalizes and broadcasts. Every
//! response uses the `{ data, error }` envelope; a non-empty `error`
//! surfaces as an assist-service failure carrying that message.

#![cfg_attr(not(feature = "http-executor"), allow(dead_code))]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::config::AssistConfig;
use super::http;
use crate::builder::FundingUtxo;
use crate::services::{AssistService, PreCommitGrant};
use crate::{PinkitError, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitRequest<'a> {
    gas_chain: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantDto {
    tx_id: String,
    index: u32,
    amount: u64,
    address: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreRequest<'a> {
    tx_hex: &'a str,
    address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreDto {
    tx_hex: String,
    order_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest<'a> {
    tx_hex: &'a str,
    order_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitDto {
    tx_id: String,
}

/// HTTP implementation of the [`AssistService`] capability.
pub struct AssistClient {
    config: AssistConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl AssistClient {
    /// Create a new assist client.
    #[cfg(feature = "http-executor")]
    pub fn new(config: AssistConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Create a new assist client (stub when the feature is disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: AssistConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// The client configuration.
    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    fn gas_path(&self, endpoint: &str) -> String {
        format!("v1/assist/gas/{}/{endpoint}", self.config.chain)
    }

    #[cfg(feature = "http-executor")]
    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = http::join_url(&self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| http::map_reqwest_error(operation, e))?;
        let response = http::check_status(operation, response).await?;
        let envelope: http::Envelope<T> = response
            .json()
            .await
            .map_err(|e| PinkitError::network(operation, format!("invalid response: {e}")))?;
        if let Some(message) = envelope.error.filter(|m| !m.is_empty()) {
            return Err(PinkitError::assist(message));
        }
        envelope
            .data
            .ok_or_else(|| PinkitError::network(operation, "response carried no data"))
    }

    #[cfg(not(feature = "http-executor"))]
    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        _operation: &'static str,
        _path: &str,
        _body: &B,
    ) -> Result<T> {
        Err(PinkitError::Unimplemented("assist client"))
    }

    #[cfg(feature = "http-executor")]
    async fn post_optional<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let url = http::join_url(&self.config.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| http::map_reqwest_error(operation, e))?;
        let response = http::check_status(operation, response).await?;
        let envelope: http::Envelope<T> = response
            .json()
            .await
            .map_err(|e| PinkitError::network(operation, format!("invalid response: {e}")))?;
        if let Some(message) = envelope.error.filter(|m| !m.is_empty()) {
            return Err(PinkitError::assist(message));
        }
        Ok(envelope.data)
    }

    #[cfg(not(feature = "http-executor"))]
    async fn post_optional<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        _operation: &'static str,
        _path: &str,
        _body: &B,
    ) -> Result<Option<T>> {
        Err(PinkitError::Unimplemented("assist client"))
    }
}

#[async_trait]
impl AssistService for AssistClient {
    async fn init_grant(&self, address: &str) -> Result<Option<FundingUtxo>> {
        let body = InitRequest {
            gas_chain: &self.config.chain,
            address,
        };
        let grant: Option<GrantDto> = self
            .post_optional("assist grant", &self.gas_path("address-init"), &body)
            .await?;
        Ok(grant.map(|g| FundingUtxo::new(g.tx_id, g.index, g.amount, g.address)))
    }

    async fn pre_commit(&self, unsigned_tx_hex: &str, address: &str) -> Result<PreCommitGrant> {
        let body = PreRequest {
            tx_hex: unsigned_tx_hex,
            address,
        };
        let pre: PreDto = self
            .post("assist pre-commit", &self.gas_path("pre"), &body)
            .await?;
        Ok(PreCommitGrant {
            funded_tx_hex: pre.tx_hex,
            order_id: pre.order_id,
        })
    }

    async fn commit(&self, signed_tx_hex: &str, order_id: &str) -> Result<String> {
        let body = CommitRequest {
            tx_hex: signed_tx_hex,
            order_id,
        };
        let commit: CommitDto = self
            .post("assist commit", &self.gas_path("commit"), &body)
            .await?;
        Ok(commit.tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_paths_carry_the_chain() {
        let client = AssistClient::new(AssistConfig::new("https://assist.example")).unwrap();
        assert_eq!(client.gas_path("pre"), "v1/assist/gas/mvc/pre");

        let client =
            AssistClient::new(AssistConfig::new("https://assist.example").with_chain("side"))
                .unwrap();
        assert_eq!(
            client.gas_path("address-init"),
            "v1/assist/gas/side/address-init"
        );
    }
}
