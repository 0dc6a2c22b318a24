//! Message processing
//!
//! The shipped processor only simulates work: it accepts every message except
//! for an injected one-in-N failure that exercises the error list.

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Processing failed for message {message}: {reason}")]
pub struct ProcessingError {
    pub message: String,
    pub reason: String,
}

impl ProcessingError {
    pub fn new(message: &str, reason: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            reason: reason.into(),
        }
    }
}

/// Business logic applied to every popped message.
///
/// The consumer awaits the result before scheduling its next poll. A failure
/// moves the message to the error list; it is never retried in place.
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process(&self, message: &str) -> Result<(), ProcessingError>;
}

/// Processor that fails roughly one in `failure_one_in` messages
#[derive(Debug, Clone)]
pub struct SimulatedProcessor {
    failure_one_in: u32,
}

impl SimulatedProcessor {
    /// `failure_one_in == 0` never fails
    pub fn new(failure_one_in: u32) -> Self {
        Self { failure_one_in }
    }

    fn should_fail(&self) -> bool {
        self.failure_one_in > 0 && rand::rng().random_range(0..self.failure_one_in) == 0
    }
}

impl Default for SimulatedProcessor {
    fn default() -> Self {
        Self::new(20)
    }
}

#[async_trait]
impl MessageProcessor for SimulatedProcessor {
    async fn process(&self, message: &str) -> Result<(), ProcessingError> {
        if self.should_fail() {
            return Err(ProcessingError::new(message, "simulated failure"));
        }
        info!(message = %message, "Message received");
        Ok(())
    }
}
