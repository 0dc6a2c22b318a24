//! Consumer loop step
//!
//! One step is either a pop or, every `check_every_cycles` pops, a lease
//! probe. Empty pops back off with the long delay; processed messages
//! (successful or sidelined) use the short one.

use std::sync::Arc;
use std::time::Duration;

use lq_standby::{ClaimOutcome, LeaseTracker};
use lq_store::Store;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::processor::MessageProcessor;
use crate::state::{InstanceState, Schedule};

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub queue_name: String,
    pub error_queue: String,
    pub check_every_cycles: u32,
    pub receive_delay: Duration,
    pub empty_retry_delay: Duration,
}

pub struct Consumer {
    config: ConsumerConfig,
    store: Arc<dyn Store>,
    lease: Arc<LeaseTracker>,
    processor: Arc<dyn MessageProcessor>,
}

impl Consumer {
    pub fn new(
        config: ConsumerConfig,
        store: Arc<dyn Store>,
        lease: Arc<LeaseTracker>,
        processor: Arc<dyn MessageProcessor>,
    ) -> Self {
        Self {
            config,
            store,
            lease,
            processor,
        }
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Make `state`'s next step a liveness check
    pub fn schedule_check(&self, state: &mut InstanceState) {
        state.set_poll_cycle_count(self.config.check_every_cycles);
    }

    pub async fn step(&self, state: &mut InstanceState) -> Result<Schedule> {
        if state.poll_cycle_count() >= self.config.check_every_cycles {
            state.reset_poll_cycles();
            return self.check_generator(state).await;
        }

        state.record_poll_cycle();

        let Some(message) = self.store.pop_head(&self.config.queue_name).await? else {
            debug!(queue = %self.config.queue_name, "Queue empty");
            return Ok(Schedule::After(self.config.empty_retry_delay));
        };

        match self.processor.process(&message).await {
            Ok(()) => debug!(message = %message, "Message processed"),
            Err(e) => {
                warn!(message = %message, error = %e, "Error occurred in message");
                self.sideline(&message).await;
            }
        }

        Ok(Schedule::After(self.config.receive_delay))
    }

    async fn check_generator(&self, state: &mut InstanceState) -> Result<Schedule> {
        if self.lease.claim_or_defer().await? == ClaimOutcome::Claimed && state.promote() {
            info!(queue = %self.config.queue_name, "No live generator, promoted to generator");
        }
        Ok(Schedule::Immediately)
    }

    /// Push a failed message onto the error list. Best effort: a failed push
    /// loses the message.
    async fn sideline(&self, message: &str) {
        if let Err(e) = self.store.push_tail(&self.config.error_queue, message).await {
            warn!(
                message = %message,
                error_queue = %self.config.error_queue,
                error = %e,
                "Failed to sideline message, dropping it"
            );
        }
    }
}
