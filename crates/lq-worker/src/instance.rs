//! Instance runner
//!
//! Drives one instance: checks the stop flag, runs the step for the current
//! role, then waits as the step's [`Schedule`] asks. Role changes take effect
//! on the following step.

use std::sync::Arc;
use std::time::Duration;

use lq_config::AppConfig;
use lq_standby::{LeaseConfig, LeaseTracker};
use lq_store::Store;
use tracing::{error, info, info_span, Instrument};

use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::Result;
use crate::generator::Generator;
use crate::processor::MessageProcessor;
use crate::state::{InstanceState, Role, Schedule, StopHandle};

/// Settings for one worker instance
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub instance_id: String,
    pub queue_name: String,
    pub error_queue: String,
    pub lease_key: String,
    pub lease_ttl_seconds: u64,
    pub check_every_cycles: u32,
    pub generate_delay: Duration,
    pub receive_delay: Duration,
    pub empty_retry_delay: Duration,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            instance_id: config.resolved_instance_id(),
            queue_name: config.queue.name.clone(),
            error_queue: config.queue.error_queue(),
            lease_key: config.lease.key.clone(),
            lease_ttl_seconds: config.lease.ttl_seconds,
            check_every_cycles: config.lease.check_every_cycles,
            generate_delay: config.timing.generate_delay(),
            receive_delay: config.timing.receive_delay(),
            empty_retry_delay: config.timing.empty_retry_delay(),
        }
    }

    pub fn with_instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = id.into();
        self
    }

    fn lease_config(&self) -> LeaseConfig {
        LeaseConfig::new(self.lease_key.clone(), self.lease_ttl_seconds)
            .with_instance_id(self.instance_id.clone())
    }

    fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            queue_name: self.queue_name.clone(),
            error_queue: self.error_queue.clone(),
            check_every_cycles: self.check_every_cycles,
            receive_delay: self.receive_delay,
            empty_retry_delay: self.empty_retry_delay,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

pub struct Instance {
    instance_id: String,
    store: Arc<dyn Store>,
    generator: Generator,
    consumer: Consumer,
    state: InstanceState,
}

impl Instance {
    /// Build an instance in the given starting role.
    ///
    /// A consumer starts due for a liveness check, so an instance started
    /// with no generator around promotes itself on its first step.
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn Store>,
        processor: Arc<dyn MessageProcessor>,
        role: Role,
    ) -> Self {
        let lease = Arc::new(LeaseTracker::new(config.lease_config(), store.clone()));
        let generator = Generator::new(
            store.clone(),
            lease.clone(),
            config.queue_name.clone(),
            config.generate_delay,
        );
        let consumer = Consumer::new(config.consumer_config(), store.clone(), lease, processor);

        let mut state = InstanceState::new(role, StopHandle::new());
        if role == Role::Consumer {
            consumer.schedule_check(&mut state);
        }

        Self {
            instance_id: config.instance_id,
            store,
            generator,
            consumer,
            state,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn role(&self) -> Role {
        self.state.role()
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.state.stop_handle()
    }

    /// Run one step for the current role
    pub async fn step(&mut self) -> Result<Schedule> {
        match self.state.role() {
            Role::Generator => self.generator.step(&mut self.state).await,
            Role::Consumer => self.consumer.step(&mut self.state).await,
        }
    }

    /// Run until stopped or a fatal error.
    ///
    /// The store is closed on either exit path.
    pub async fn run(mut self) -> Result<()> {
        let span = info_span!(
            "instance",
            instance_id = %self.instance_id,
            store = %self.store.identifier(),
        );

        async move {
            info!(role = ?self.state.role(), "Starting instance");

            loop {
                if !self.state.is_running() {
                    info!(role = ?self.state.role(), "Stop requested, closing connection");
                    self.store.close().await;
                    return Ok(());
                }

                let schedule = match self.step().await {
                    Ok(schedule) => schedule,
                    Err(e) => {
                        error!(error = %e, role = ?self.state.role(), "Fatal error, stopping instance");
                        self.store.close().await;
                        return Err(e);
                    }
                };

                match schedule {
                    Schedule::Immediately => tokio::task::yield_now().await,
                    Schedule::After(delay) => tokio::time::sleep(delay).await,
                }
            }
        }
        .instrument(span)
        .await
    }
}
