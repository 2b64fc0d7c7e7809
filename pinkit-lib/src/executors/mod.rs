//! HTTP implementations of the collaborator traits.
//!
//! ## Feature flags
//!
//! The `http-executor` feature flag must be enabled for actual HTTP
//! requests:
//!
//! ```toml
//! [dependencies]
//! pinkit-lib = { version = "0.1", features = ["http-executor"] }
//! ```
//!
//! Without it the clients still compile and construct, but network
//! methods return an `Unimplemented` error.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pinkit_lib::executors::{AssistClient, AssistConfig, IndexerClient, IndexerConfig};
//!
//! let indexer = IndexerClient::new(IndexerConfig::testnet())?;
//! let utxo = indexer.find_spendable_output("mi...").await?;
//!
//! let assist = AssistClient::new(AssistConfig::new("https://assist.example"))?;
//! let grant = assist.init_grant("mi...").await?;
//! ```

mod assist;
mod broadcast;
mod config;
mod http;
mod indexer;

pub use assist::AssistClient;
pub use broadcast::{BroadcastClient, NotifyClient};
pub use config::{AssistConfig, BroadcastConfig, IndexerConfig, NotifyConfig};
pub use indexer::IndexerClient;
