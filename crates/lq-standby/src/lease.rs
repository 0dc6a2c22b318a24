//! Generator lease tracking
//!
//! Implements the claim protocol:
//! - EXISTS on the lease key; a live lease means defer
//! - Otherwise a guarded transaction (WATCH + SET + EXPIRE + EXEC)
//! - EXEC abort means another instance won the race; defer as well

use std::sync::Arc;

use lq_common::{DEFAULT_LEASE_KEY, DEFAULT_LEASE_TTL_SECONDS};
use lq_store::{Store, Transaction, TxOutcome};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;

/// Configuration for the generator lease
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Key whose presence means a generator is alive
    pub lease_key: String,

    /// Lease TTL in seconds
    pub ttl_seconds: u64,

    /// Written as the lease value so the holder is visible in the store
    pub instance_id: String,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            lease_key: DEFAULT_LEASE_KEY.to_string(),
            ttl_seconds: DEFAULT_LEASE_TTL_SECONDS,
            instance_id: Uuid::new_v4().to_string(),
        }
    }
}

impl LeaseConfig {
    pub fn new(lease_key: String, ttl_seconds: u64) -> Self {
        Self {
            lease_key,
            ttl_seconds,
            ..Default::default()
        }
    }

    pub fn with_instance_id(mut self, id: String) -> Self {
        self.instance_id = id;
        self
    }
}

/// Outcome of a liveness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This instance now holds the lease and must act as generator
    Claimed,
    /// A generator is alive, or another instance claimed first
    Deferred,
}

/// Owns the lease key and the claim protocol
pub struct LeaseTracker {
    config: LeaseConfig,
    store: Arc<dyn Store>,
}

impl LeaseTracker {
    pub fn new(config: LeaseConfig, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &LeaseConfig {
        &self.config
    }

    /// Whether some generator currently holds the lease
    pub async fn is_held(&self) -> Result<bool> {
        Ok(self.store.exists(&self.config.lease_key).await?)
    }

    /// Claim the lease if nobody holds it.
    ///
    /// A held lease returns [`ClaimOutcome::Deferred`] without opening a
    /// transaction. Store errors are returned to the caller.
    pub async fn claim_or_defer(&self) -> Result<ClaimOutcome> {
        debug!(lease_key = %self.config.lease_key, "Checking generator is alive");

        if self.is_held().await? {
            debug!(lease_key = %self.config.lease_key, "Generator lease held");
            return Ok(ClaimOutcome::Deferred);
        }

        let claim = Transaction::when_absent(self.config.lease_key.clone())
            .set(self.config.lease_key.clone(), self.config.instance_id.clone())
            .expire(self.config.lease_key.clone(), self.config.ttl_seconds);

        match self.store.commit(claim).await? {
            TxOutcome::Committed => {
                info!(
                    instance_id = %self.config.instance_id,
                    lease_key = %self.config.lease_key,
                    ttl_seconds = self.config.ttl_seconds,
                    "Claimed generator lease"
                );
                Ok(ClaimOutcome::Claimed)
            }
            TxOutcome::Aborted => {
                info!(
                    instance_id = %self.config.instance_id,
                    "Lost generator lease race, staying consumer"
                );
                Ok(ClaimOutcome::Deferred)
            }
        }
    }

    /// Start a transaction that renews the lease value and TTL.
    ///
    /// The generator appends its queue push and commits both together.
    pub fn renewal(&self) -> Transaction {
        Transaction::new()
            .set(self.config.lease_key.clone(), self.config.instance_id.clone())
            .expire(self.config.lease_key.clone(), self.config.ttl_seconds)
    }
}
