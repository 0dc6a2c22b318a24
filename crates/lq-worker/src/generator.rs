//! Generator loop step
//!
//! Each step renews the lease and pushes one message in a single MULTI/EXEC.
//! A generator that stops stepping lets its lease lapse after the TTL, which is
//! how consumers detect its absence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lq_standby::LeaseTracker;
use lq_store::{Store, TxOutcome};
use rand::Rng;
use tracing::info;

use crate::error::{Result, WorkerError};
use crate::state::{InstanceState, Schedule};

/// Queue name, one random digit, and the epoch-millisecond timestamp.
///
/// Two messages built in the same millisecond with the same digit collide;
/// nothing deduplicates them.
pub fn build_message(queue_name: &str, digit: u8, timestamp_ms: i64) -> String {
    format!("{}{}{}", queue_name, digit, timestamp_ms)
}

pub struct Generator {
    store: Arc<dyn Store>,
    lease: Arc<LeaseTracker>,
    queue_name: String,
    delay: Duration,
}

impl Generator {
    pub fn new(
        store: Arc<dyn Store>,
        lease: Arc<LeaseTracker>,
        queue_name: String,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            lease,
            queue_name,
            delay,
        }
    }

    fn next_message(&self) -> String {
        let digit = rand::rng().random_range(0..10u8);
        build_message(&self.queue_name, digit, Utc::now().timestamp_millis())
    }

    /// Generate one message. Any failure to commit is fatal.
    pub async fn step(&self, _state: &mut InstanceState) -> Result<Schedule> {
        let message = self.next_message();
        let tx = self
            .lease
            .renewal()
            .push_tail(self.queue_name.clone(), message.clone());

        match self.store.commit(tx).await? {
            TxOutcome::Committed => {
                info!(message = %message, "Message generated");
                Ok(Schedule::After(self.delay))
            }
            TxOutcome::Aborted => Err(WorkerError::GeneratorAborted(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message_layout() {
        assert_eq!(build_message("messages", 7, 1_700_000_000_123), "messages71700000000123");
    }
}
