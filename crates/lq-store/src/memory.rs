//! In-memory store for tests and local runs
//!
//! Mirrors the Redis semantics the worker relies on: key TTLs (on the tokio
//! clock, so paused-time tests can expire leases), FIFO lists, and guarded
//! transactions that apply atomically under a single lock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{Result, StoreError};
use crate::{ttl_arg, Store, Transaction, TxCommand, TxGuard, TxOutcome};

/// Accepts the same TTL range as Redis EXPIRE
fn expiry_deadline(ttl_seconds: u64) -> Result<Instant> {
    ttl_arg(ttl_seconds)?;
    Instant::now()
        .checked_add(Duration::from_secs(ttl_seconds))
        .ok_or(StoreError::InvalidTtl(ttl_seconds))
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Default)]
struct State {
    values: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<String>>,
}

impl State {
    fn purge_expired(&mut self, key: &str) {
        let expired = self
            .values
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|at| at <= Instant::now());
        if expired {
            self.values.remove(key);
        }
    }

    fn contains(&mut self, key: &str) -> bool {
        self.purge_expired(key);
        self.values.contains_key(key) || self.lists.get(key).is_some_and(|l| !l.is_empty())
    }

    fn set(&mut self, key: &str, value: &str) {
        // SET discards any previous TTL
        self.values.insert(
            key.to_string(),
            Entry { value: value.to_string(), expires_at: None },
        );
    }

    fn expire(&mut self, key: &str, expires_at: Instant) -> bool {
        self.purge_expired(key);
        match self.values.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                true
            }
            None => false,
        }
    }

    fn push_tail(&mut self, list: &str, value: &str) -> u64 {
        let entries = self.lists.entry(list.to_string()).or_default();
        entries.push_back(value.to_string());
        entries.len() as u64
    }

    fn pop_head(&mut self, list: &str) -> Option<String> {
        let entries = self.lists.get_mut(list)?;
        let value = entries.pop_front();
        if entries.is_empty() {
            self.lists.remove(list);
        }
        value
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
    closed: AtomicBool,
    transactions: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            closed: AtomicBool::new(false),
            transactions: AtomicU64::new(0),
        }
    }

    /// Number of `commit` calls made against this store
    pub fn transaction_count(&self) -> u64 {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Snapshot of a list, head first
    pub fn list(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .lists
            .get(key)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current value of a live key
    pub fn value(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        state.purge_expired(key);
        state.values.get(key).map(|entry| entry.value.clone())
    }

    /// Remaining time-to-live of a key, `None` if absent or persistent
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut state = self.state.lock();
        state.purge_expired(key);
        state
            .values
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn identifier(&self) -> &str {
        "memory"
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.state.lock().contains(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        self.state.lock().set(key, value);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        self.ensure_open()?;
        let expires_at = expiry_deadline(ttl_seconds)?;
        Ok(self.state.lock().expire(key, expires_at))
    }

    async fn push_tail(&self, list: &str, value: &str) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.state.lock().push_tail(list, value))
    }

    async fn pop_head(&self, list: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.state.lock().pop_head(list))
    }

    async fn commit(&self, tx: Transaction) -> Result<TxOutcome> {
        self.ensure_open()?;
        self.transactions.fetch_add(1, Ordering::SeqCst);

        // Resolve every TTL first so a bad one rejects the whole transaction
        let deadlines = tx
            .commands()
            .iter()
            .map(|command| match command {
                TxCommand::Expire { ttl_seconds, .. } => expiry_deadline(*ttl_seconds).map(Some),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.lock();
        if let Some(TxGuard::Absent(key)) = tx.guard() {
            if state.contains(key) {
                return Ok(TxOutcome::Aborted);
            }
        }

        for (command, deadline) in tx.commands().iter().zip(deadlines) {
            match command {
                TxCommand::Set { key, value } => state.set(key, value),
                TxCommand::Expire { key, .. } => {
                    if let Some(expires_at) = deadline {
                        state.expire(key, expires_at);
                    }
                }
                TxCommand::PushTail { key, value } => {
                    state.push_tail(key, value);
                }
            }
        }

        Ok(TxOutcome::Committed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
