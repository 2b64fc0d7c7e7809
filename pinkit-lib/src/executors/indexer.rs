//! Ledger/identity indexer client.

#![cfg_attr(not(feature = "http-executor"), allow(dead_code))]

use async_trait::async_trait;
use serde::Deserialize;

use super::config::IndexerConfig;
use super::http;
use crate::builder::FundingUtxo;
use crate::services::{IdentityRecord, Indexer};
use crate::{PinkitError, Result};

/// One unspent output as reported by the indexer.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UtxoDto {
    tx_id: String,
    #[serde(default)]
    vout: u32,
    satoshi: u64,
    #[serde(default)]
    confirmed: bool,
}

#[derive(Debug, Deserialize)]
struct RawTxDto {
    hex: String,
}

/// HTTP implementation of the [`Indexer`] capability.
pub struct IndexerClient {
    config: IndexerConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl IndexerClient {
    /// Create a new indexer client.
    #[cfg(feature = "http-executor")]
    pub fn new(config: IndexerConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Create a new indexer client (stub when the feature is disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: IndexerConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// The client configuration.
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    #[cfg(feature = "http-executor")]
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T> {
        let url = http::join_url(&self.config.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| http::map_reqwest_error(operation, e))?;
        let response = http::check_status(operation, response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PinkitError::network(operation, format!("invalid response: {e}")))
    }

    #[cfg(not(feature = "http-executor"))]
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        _operation: &'static str,
        _path: &str,
    ) -> Result<T> {
        Err(PinkitError::Unimplemented("indexer client"))
    }
}

#[async_trait]
impl Indexer for IndexerClient {
    async fn find_spendable_output(&self, address: &str) -> Result<Option<FundingUtxo>> {
        let envelope: http::Envelope<Vec<UtxoDto>> = self
            .get("find spendable output", &format!("api/address/{address}/utxo"))
            .await?;
        let utxos = envelope.data.unwrap_or_default();
        Ok(utxos
            .into_iter()
            .find(|u| u.confirmed)
            .map(|u| FundingUtxo::new(u.tx_id, u.vout, u.satoshi, address)))
    }

    async fn fetch_raw_transaction(&self, txid: &str) -> Result<Vec<u8>> {
        let raw: RawTxDto = self
            .get("fetch raw transaction", &format!("tx/{txid}/raw"))
            .await?;
        hex::decode(&raw.hex).map_err(|e| {
            PinkitError::network("fetch raw transaction", format!("invalid hex payload: {e}"))
        })
    }

    async fn lookup_identity(&self, address: &str) -> Result<Option<IdentityRecord>> {
        let envelope: http::Envelope<IdentityRecord> = self
            .get("lookup identity", &format!("api/info/address/{address}"))
            .await?;
        Ok(envelope.data)
    }
}
