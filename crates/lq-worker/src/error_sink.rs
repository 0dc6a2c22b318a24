//! Error list drain
//!
//! Separate mode from the main loop: pops every sidelined message, hands it to
//! the caller, and closes the connection once the list is empty.

use std::sync::Arc;

use lq_store::Store;
use tracing::{error, info};

use crate::error::Result;

pub struct ErrorSink {
    store: Arc<dyn Store>,
    error_queue: String,
}

impl ErrorSink {
    pub fn new(store: Arc<dyn Store>, error_queue: String) -> Self {
        Self { store, error_queue }
    }

    pub fn error_queue(&self) -> &str {
        &self.error_queue
    }

    /// Pop and emit until the error list is empty, then close the store.
    ///
    /// Each message is popped before it is emitted, so no message is emitted
    /// twice. Returns the number of messages drained.
    pub async fn drain<F>(&self, mut emit: F) -> Result<usize>
    where
        F: FnMut(&str) + Send,
    {
        let mut drained = 0;

        loop {
            match self.store.pop_head(&self.error_queue).await {
                Ok(Some(message)) => {
                    emit(&message);
                    drained += 1;
                    tokio::task::yield_now().await;
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, error_queue = %self.error_queue, "Failed to drain error list");
                    self.store.close().await;
                    return Err(e.into());
                }
            }
        }

        info!(drained, error_queue = %self.error_queue, "All errors processed");
        self.store.close().await;
        Ok(drained)
    }
}
