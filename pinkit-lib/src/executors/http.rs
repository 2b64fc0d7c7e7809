//! Shared HTTP plumbing for the executor clients.

#![cfg_attr(not(feature = "http-executor"), allow(dead_code))]

use serde::Deserialize;

#[cfg(feature = "http-executor")]
use crate::PinkitError;
#[cfg(feature = "http-executor")]
use crate::Result;

/// Response envelope used by the indexer and assist APIs.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: serde::de::DeserializeOwned")]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(feature = "http-executor")]
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PinkitError::network("build HTTP client", e.to_string()))
}

#[cfg(feature = "http-executor")]
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Map transport-level failures onto the error taxonomy.
#[cfg(feature = "http-executor")]
pub(crate) fn map_reqwest_error(operation: &'static str, err: reqwest::Error) -> PinkitError {
    if err.is_timeout() {
        PinkitError::network(operation, "request timed out")
    } else {
        PinkitError::network(operation, err.to_string())
    }
}

/// Surface non-2xx responses as network errors with the body attached.
#[cfg(feature = "http-executor")]
pub(crate) async fn check_status(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(PinkitError::network(
        operation,
        format!("status {status}: {text}"),
    ))
}
