//! Test doubles shared by the worker integration tests

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lq_standby::{LeaseConfig, LeaseTracker};
use lq_store::{decode_message, MemoryStore, Store, StoreError, Transaction, TxOutcome};
use lq_worker::{ConsumerConfig, MessageProcessor, ProcessingError, WorkerConfig};

pub const QUEUE: &str = "messages";
pub const ERROR_QUEUE: &str = "messages-Errors";
pub const LEASE_KEY: &str = "Last_time_generator_was_alive";

/// Processor that fails a fixed set of messages and records every call
pub struct ScriptedProcessor {
    failing: HashSet<String>,
    call_count: AtomicU32,
    processed: parking_lot::Mutex<Vec<String>>,
}

impl ScriptedProcessor {
    pub fn succeeding() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(messages: &[&str]) -> Self {
        Self {
            failing: messages.iter().map(|m| m.to_string()).collect(),
            call_count: AtomicU32::new(0),
            processed: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().clone()
    }
}

#[async_trait]
impl MessageProcessor for ScriptedProcessor {
    async fn process(&self, message: &str) -> Result<(), ProcessingError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.processed.lock().push(message.to_string());

        if self.failing.contains(message) {
            Err(ProcessingError::new(message, "scripted failure"))
        } else {
            Ok(())
        }
    }
}

/// Memory store with injectable faults
pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_commit: bool,
    abort_commit: bool,
    fail_push_to: Option<String>,
    raw_list: Option<(String, parking_lot::Mutex<VecDeque<Vec<u8>>>)>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_commit: false,
            abort_commit: false,
            fail_push_to: None,
            raw_list: None,
        }
    }

    /// Every commit returns a transaction error
    pub fn failing_commits() -> Self {
        Self { fail_commit: true, ..Self::new() }
    }

    /// Every commit reports an EXEC abort
    pub fn aborting_commits() -> Self {
        Self { abort_commit: true, ..Self::new() }
    }

    /// Direct pushes to `list` fail
    pub fn failing_push_to(list: &str) -> Self {
        Self { fail_push_to: Some(list.to_string()), ..Self::new() }
    }

    /// Pops from `list` return these raw elements, decoded the way `RedisStore` does
    pub fn with_raw_list(list: &str, elements: Vec<Vec<u8>>) -> Self {
        Self {
            raw_list: Some((list.to_string(), parking_lot::Mutex::new(elements.into()))),
            ..Self::new()
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    fn identifier(&self) -> &str {
        "faulty"
    }

    async fn exists(&self, key: &str) -> lq_store::Result<bool> {
        self.inner.exists(key).await
    }

    async fn set(&self, key: &str, value: &str) -> lq_store::Result<()> {
        self.inner.set(key, value).await
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> lq_store::Result<bool> {
        self.inner.expire(key, ttl_seconds).await
    }

    async fn push_tail(&self, list: &str, value: &str) -> lq_store::Result<u64> {
        if self.fail_push_to.as_deref() == Some(list) {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        self.inner.push_tail(list, value).await
    }

    async fn pop_head(&self, list: &str) -> lq_store::Result<Option<String>> {
        if let Some((raw_key, elements)) = &self.raw_list {
            if raw_key == list {
                return Ok(elements.lock().pop_front().map(decode_message));
            }
        }
        self.inner.pop_head(list).await
    }

    async fn commit(&self, tx: Transaction) -> lq_store::Result<TxOutcome> {
        if self.fail_commit {
            return Err(StoreError::Transaction("EXECABORT".to_string()));
        }
        if self.abort_commit {
            return Ok(TxOutcome::Aborted);
        }
        self.inner.commit(tx).await
    }

    async fn close(&self) {
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

pub fn consumer_config() -> ConsumerConfig {
    ConsumerConfig {
        queue_name: QUEUE.to_string(),
        error_queue: ERROR_QUEUE.to_string(),
        check_every_cycles: 10,
        receive_delay: Duration::from_millis(200),
        empty_retry_delay: Duration::from_millis(1000),
    }
}

pub fn worker_config(instance_id: &str) -> WorkerConfig {
    WorkerConfig::default().with_instance_id(instance_id)
}

pub fn lease_tracker(store: Arc<dyn Store>, instance_id: &str) -> Arc<LeaseTracker> {
    let config = LeaseConfig::new(LEASE_KEY.to_string(), 10)
        .with_instance_id(instance_id.to_string());
    Arc::new(LeaseTracker::new(config, store))
}

/// Put a live lease held by someone else into the store
pub async fn hold_lease(store: &dyn Store, holder: &str) {
    store.set(LEASE_KEY, holder).await.unwrap();
    store.expire(LEASE_KEY, 10).await.unwrap();
}
