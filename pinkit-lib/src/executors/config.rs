//! Configuration types for the HTTP executors.

use serde::{Deserialize, Serialize};

use crate::Network;

fn default_timeout() -> u64 {
    30
}

fn default_chain() -> String {
    "mvc".to_string()
}

/// Configuration for the ledger/identity indexer client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Indexer API base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl IndexerConfig {
    /// Create a new indexer configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// Preset for the public mainnet indexer.
    pub fn mainnet() -> Self {
        Self::new("https://man.metaid.io")
    }

    /// Preset for the public testnet indexer.
    pub fn testnet() -> Self {
        Self::new("https://man-test.metaid.io")
    }
}

/// Configuration for the fee-sponsoring assist service client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Assist service base URL.
    pub base_url: String,
    /// Chain identifier sent with gas requests.
    #[serde(default = "default_chain")]
    pub chain: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AssistConfig {
    /// Create a new assist configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chain: default_chain(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the chain identifier.
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }
}

/// Configuration for the broadcast client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Broadcast API base URL.
    pub base_url: String,
    /// Chain identifier sent with broadcasts.
    #[serde(default = "default_chain")]
    pub chain: String,
    /// Network the transactions target.
    pub network: Network,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl BroadcastConfig {
    /// Create a new broadcast configuration.
    pub fn new(base_url: impl Into<String>, network: Network) -> Self {
        Self {
            base_url: base_url.into(),
            chain: default_chain(),
            network,
            timeout_secs: default_timeout(),
        }
    }
}

/// Configuration for the best-effort notifier client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Notification endpoint base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotifyConfig {
    /// Create a new notifier configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert!(IndexerConfig::testnet().base_url.contains("test"));
        assert!(!IndexerConfig::mainnet().base_url.contains("test"));
        assert_eq!(IndexerConfig::mainnet().timeout_secs, 30);
    }

    #[test]
    fn assist_chain_override() {
        let config = AssistConfig::new("https://assist.example").with_chain("side");
        assert_eq!(config.chain, "side");
    }
}
