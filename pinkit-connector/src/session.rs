//! Wallet session.
//!
//! A [`PinSession`] is the explicit handle every orchestration call goes
//! through: it owns the collaborator capabilities, the network
//! configuration, and the identity state fetched at connect time. A
//! session cannot be constructed without a signer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sha2::{Digest, Sha256};

use pinkit_lib::{
    AssistService, Broadcaster, DataLimits, IdentityRecord, Indexer, Network, Notifier,
    PinkitError, Result, Signer,
};

/// Bounded retry applied when a funding grant has not landed yet.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Re-read attempts after the initial query.
    pub max_attempts: u32,
    /// Pause before each re-read.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits, for tests.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 1,
            interval: Duration::ZERO,
        }
    }
}

/// Session-wide configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionConfig {
    /// Network transactions are composed for.
    pub network: Network,
    /// Payload size policy.
    pub limits: DataLimits,
    /// Funding-grant retry policy.
    pub funding_retry: RetryPolicy,
    /// Default fee rate hint handed to the signer, in sat/byte.
    pub fee_rate: Option<f64>,
}

/// Capabilities injected into a session.
///
/// The signer is optional here so that callers can assemble the struct
/// from whatever they have; [`PinSession::connect`] is where a missing
/// signer becomes a hard error.
pub struct Collaborators {
    /// Signing and fee-payment capability.
    pub signer: Option<Arc<dyn Signer>>,
    /// Ledger broadcast capability.
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Ledger and identity read capability.
    pub indexer: Arc<dyn Indexer>,
    /// Optional fee-sponsoring assist service.
    pub assist: Option<Arc<dyn AssistService>>,
    /// Optional best-effort notifier.
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// A connected wallet session.
pub struct PinSession {
    config: SessionConfig,
    signer: Arc<dyn Signer>,
    broadcaster: Arc<dyn Broadcaster>,
    indexer: Arc<dyn Indexer>,
    assist: Option<Arc<dyn AssistService>>,
    notifier: Option<Arc<dyn Notifier>>,
    address: String,
    identity_digest: String,
    user: Mutex<Option<IdentityRecord>>,
    connected: AtomicBool,
}

impl PinSession {
    /// Connect a session over the given collaborators.
    ///
    /// Fails with [`PinkitError::NotConnected`] when no signer is bound.
    /// The current identity record is fetched from the indexer; an
    /// absent identity is not an error.
    pub async fn connect(config: SessionConfig, collaborators: Collaborators) -> Result<Self> {
        let signer = collaborators.signer.ok_or(PinkitError::NotConnected)?;
        let address = signer.address();
        let identity_digest = hex::encode(Sha256::digest(address.as_bytes()));
        let user = collaborators.indexer.lookup_identity(&address).await?;

        Ok(Self {
            config,
            signer,
            broadcaster: collaborators.broadcaster,
            indexer: collaborators.indexer,
            assist: collaborators.assist,
            notifier: collaborators.notifier,
            address,
            identity_digest,
            user: Mutex::new(user),
            connected: AtomicBool::new(true),
        })
    }

    /// The wallet address this session signs for.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Hex digest identifying this wallet across records.
    pub fn identity_digest(&self) -> &str {
        &self.identity_digest
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Network this session composes transactions for.
    pub fn network(&self) -> Network {
        self.config.network
    }

    /// The identity record fetched at connect time (or last refresh).
    pub fn user(&self) -> Option<IdentityRecord> {
        self.user.lock().unwrap().clone()
    }

    /// Whether the address has a published identity.
    pub fn has_user(&self) -> bool {
        self.user.lock().unwrap().is_some()
    }

    /// Re-fetch the identity record from the indexer.
    pub async fn refresh_user(&self) -> Result<Option<IdentityRecord>> {
        let user = self.indexer.lookup_identity(&self.address).await?;
        *self.user.lock().unwrap() = user.clone();
        Ok(user)
    }

    /// Whether the session is still connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Disconnect: every subsequent orchestration call fails.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether an assist service is bound to this session.
    pub fn has_assist(&self) -> bool {
        self.assist.is_some()
    }

    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(PinkitError::NotConnected)
        }
    }

    pub(crate) fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub(crate) fn broadcaster(&self) -> &Arc<dyn Broadcaster> {
        &self.broadcaster
    }

    pub(crate) fn indexer(&self) -> &Arc<dyn Indexer> {
        &self.indexer
    }

    pub(crate) fn notifier(&self) -> Option<&Arc<dyn Notifier>> {
        self.notifier.as_ref()
    }

    pub(crate) fn assist_service(&self) -> Result<&Arc<dyn AssistService>> {
        self.assist.as_ref().ok_or_else(|| {
            PinkitError::invalid_input("assist_service", "no assist service bound to this session")
        })
    }
}
