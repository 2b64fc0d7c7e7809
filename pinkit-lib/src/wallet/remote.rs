//! Remote wallet-bridge signer.
//!
//! Delegates signing and batch funding to an external wallet service
//! over HTTP. Requires the `http-executor` feature for actual requests;
//! without it every call returns `Unimplemented`.

#![cfg_attr(not(feature = "http-executor"), allow(dead_code))]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
#[cfg(feature = "http-executor")]
use std::time::Duration;

use crate::builder::{PendingTransaction, SignedTransaction};
use crate::wallet::{PrevOutput, Signer};
#[cfg(feature = "http-executor")]
use crate::PinkitError;
use crate::Result;

fn default_timeout() -> u64 {
    30
}

/// Configuration for a wallet-bridge signer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteSignerConfig {
    /// Bridge endpoint URL (e.g. `https://localhost:9130`).
    pub base_url: String,
    /// Address the remote wallet signs for.
    pub address: String,
    /// Bearer token presented on every request, if the bridge wants one.
    pub auth_token: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RemoteSignerConfig {
    /// Create a new bridge configuration.
    pub fn new(base_url: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            address: address.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Set the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest<'a> {
    tx_hex: &'a str,
    to_sign_inputs: &'a [usize],
    prev_outputs: &'a [PrevOutput],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayRequest<'a> {
    transactions: Vec<PayEntry<'a>>,
    fee_rate: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayEntry<'a> {
    tx_hex: String,
    label: &'a str,
}

#[derive(Deserialize)]
struct SignResponse {
    data: String,
}

#[derive(Deserialize)]
struct PayResponse {
    data: Vec<String>,
}

/// Signer that forwards every operation to a wallet bridge.
pub struct RemoteSigner {
    config: RemoteSignerConfig,
    #[cfg(feature = "http-executor")]
    client: reqwest::Client,
}

impl RemoteSigner {
    /// Create a new remote signer for the given bridge.
    #[cfg(feature = "http-executor")]
    pub fn new(config: RemoteSignerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PinkitError::network("build HTTP client", e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Create a new remote signer (stub when the feature is disabled).
    #[cfg(not(feature = "http-executor"))]
    pub fn new(config: RemoteSignerConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// The bridge configuration.
    pub fn config(&self) -> &RemoteSignerConfig {
        &self.config
    }

    #[cfg(any(feature = "http-executor", test))]
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and parse the JSON response.
    #[cfg(feature = "http-executor")]
    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PinkitError::network(operation, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PinkitError::network(
                operation,
                format!("bridge returned {status}: {text}"),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PinkitError::network(operation, format!("invalid response: {e}")))
    }

    /// POST stub when the feature is disabled.
    #[cfg(not(feature = "http-executor"))]
    async fn post<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        _operation: &'static str,
        _path: &str,
        _body: &B,
    ) -> Result<T> {
        Err(crate::PinkitError::Unimplemented("remote signer"))
    }
}

#[async_trait]
impl Signer for RemoteSigner {
    fn address(&self) -> String {
        self.config.address.clone()
    }

    async fn sign_owned_inputs(
        &self,
        raw_tx_hex: &str,
        prev_outputs: &[PrevOutput],
        input_indexes: &[usize],
    ) -> Result<String> {
        let body = SignRequest {
            tx_hex: raw_tx_hex,
            to_sign_inputs: input_indexes,
            prev_outputs,
        };
        let response: SignResponse = self.post("sign inputs", "wallet/sign", &body).await?;
        Ok(response.data)
    }

    async fn pay_and_fund(
        &self,
        transactions: Vec<PendingTransaction>,
        fee_rate: Option<f64>,
    ) -> Result<Vec<SignedTransaction>> {
        let body = PayRequest {
            transactions: transactions
                .iter()
                .map(|p| PayEntry {
                    tx_hex: p.raw_hex(),
                    label: &p.label,
                })
                .collect(),
            fee_rate,
        };
        let response: PayResponse = self.post("pay and fund", "wallet/pay", &body).await?;
        response
            .data
            .iter()
            .map(|raw_hex| SignedTransaction::from_hex(raw_hex))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config =
            RemoteSignerConfig::new("https://bridge.example/", "mxyz").with_auth_token("secret");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn url_building() {
        let signer =
            RemoteSigner::new(RemoteSignerConfig::new("https://bridge.example/", "mxyz")).unwrap();
        assert_eq!(signer.url("wallet/pay"), "https://bridge.example/wallet/pay");
    }
}
