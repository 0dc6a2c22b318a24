//! LeaseQueue Store Client
//!
//! The only wire dependency of the worker: a shared key-value/list store
//! (Redis in production) used as lease holder and message queue.
//!
//! # Operations
//!
//! - Single keys: `exists`, `set`, `expire`
//! - Lists: `push_tail` (RPUSH), `pop_head` (LPOP)
//! - Optimistic transactions: [`Transaction`] committed through [`Store::commit`].
//!   The WATCH / MULTI / EXEC sequence stays inside the implementation; callers
//!   only see [`TxOutcome::Committed`] or [`TxOutcome::Aborted`].

use async_trait::async_trait;
use tracing::warn;

mod error;
pub mod memory;
pub mod redis_store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Largest TTL the store accepts; Redis takes a signed 64-bit EXPIRE argument
pub const MAX_TTL_SECONDS: u64 = i64::MAX as u64;

/// Convert a TTL to the EXPIRE argument, rejecting values Redis would read as negative
pub fn ttl_arg(ttl_seconds: u64) -> Result<i64> {
    i64::try_from(ttl_seconds).map_err(|_| StoreError::InvalidTtl(ttl_seconds))
}

/// Decode a popped list element.
///
/// Other clients may push arbitrary bytes. Once LPOP has returned, the element
/// is gone from the store, so undecodable bytes are replaced with U+FFFD
/// instead of failing and losing the message.
pub fn decode_message(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(message) => message,
        Err(e) => {
            let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
            warn!(message = %lossy, "Popped message is not valid UTF-8, replaced invalid bytes");
            lossy
        }
    }
}

/// A command queued inside a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxCommand {
    Set { key: String, value: String },
    Expire { key: String, ttl_seconds: u64 },
    PushTail { key: String, value: String },
}

/// Precondition checked atomically with the commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxGuard {
    /// Watch the key; abort if it exists or changes before EXEC
    Absent(String),
}

/// Result of committing a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Committed,
    /// A guarded key was present or modified concurrently
    Aborted,
}

impl TxOutcome {
    pub fn is_committed(self) -> bool {
        matches!(self, TxOutcome::Committed)
    }
}

/// A MULTI/EXEC block with an optional optimistic-locking guard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    guard: Option<TxGuard>,
    commands: Vec<TxCommand>,
}

impl Transaction {
    /// Unconditional transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction that only commits if `key` is absent and stays untouched
    pub fn when_absent(key: impl Into<String>) -> Self {
        Self {
            guard: Some(TxGuard::Absent(key.into())),
            commands: Vec::new(),
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.commands.push(TxCommand::Set { key: key.into(), value: value.into() });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, ttl_seconds: u64) -> Self {
        self.commands.push(TxCommand::Expire { key: key.into(), ttl_seconds });
        self
    }

    pub fn push_tail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.commands.push(TxCommand::PushTail { key: key.into(), value: value.into() });
        self
    }

    pub fn guard(&self) -> Option<&TxGuard> {
        self.guard.as_ref()
    }

    pub fn commands(&self) -> &[TxCommand] {
        &self.commands
    }
}

/// Contract the worker needs from the shared store.
///
/// Every call is a suspension point. Implementations are used by a single
/// sequential loop per instance, so a watched transaction never interleaves
/// with another call on the same connection.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable identifier (URL or "memory")
    fn identifier(&self) -> &str;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set a TTL on an existing key; returns false if the key does not exist
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool>;

    /// Append to the list tail, returning the new length
    async fn push_tail(&self, list: &str, value: &str) -> Result<u64>;

    /// Remove and return the list head, `None` if the list is empty
    async fn pop_head(&self, list: &str) -> Result<Option<String>>;

    async fn commit(&self, tx: Transaction) -> Result<TxOutcome>;

    /// Release the connection. Later calls fail with [`StoreError::Closed`].
    async fn close(&self);

    fn is_closed(&self) -> bool;
}
