//! Per-instance mutable state
//!
//! Owned by the runner and passed by `&mut` into every step; nothing here is
//! global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Role an instance plays against the shared queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Pushes messages and renews the lease
    Generator,
    /// Pops and processes messages, probing the lease periodically
    Consumer,
}

/// Cooperative stop flag shared between the runner and whoever stops it
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; the runner observes it before its next step
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// What the runner does after a step completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Run the next step right away
    Immediately,
    /// Run the next step after the delay
    After(Duration),
}

#[derive(Debug)]
pub struct InstanceState {
    role: Role,
    stop: StopHandle,
    poll_cycle_count: u32,
}

impl InstanceState {
    pub fn new(role: Role, stop: StopHandle) -> Self {
        Self {
            role,
            stop,
            poll_cycle_count: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_running(&self) -> bool {
        !self.stop.is_stopped()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Switch to generator. There is no way back to consumer.
    ///
    /// Returns true if the role changed.
    pub fn promote(&mut self) -> bool {
        let changed = self.role == Role::Consumer;
        self.role = Role::Generator;
        self.poll_cycle_count = 0;
        changed
    }

    pub fn poll_cycle_count(&self) -> u32 {
        self.poll_cycle_count
    }

    pub(crate) fn record_poll_cycle(&mut self) {
        self.poll_cycle_count = self.poll_cycle_count.saturating_add(1);
    }

    pub(crate) fn reset_poll_cycles(&mut self) {
        self.poll_cycle_count = 0;
    }

    /// Make the next consumer step a liveness check
    pub fn set_poll_cycle_count(&mut self, count: u32) {
        self.poll_cycle_count = count;
    }
}
