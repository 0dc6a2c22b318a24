//! LeaseQueue Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use lq_common::{
    DEFAULT_CHECK_EVERY_CYCLES, DEFAULT_LEASE_KEY, DEFAULT_LEASE_TTL_SECONDS, DEFAULT_QUEUE_NAME,
    ERROR_QUEUE_SUFFIX,
};

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Config file not found: {}", .0.display())]
    NotFound(std::path::PathBuf),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub redis: RedisConfig,
    pub queue: QueueConfig,
    pub lease: LeaseConfig,
    pub timing: TimingConfig,
    pub processing: ProcessingConfig,

    /// Instance identifier used in logs and as the lease value (random if empty)
    pub instance_id: String,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Queue key configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    pub error_suffix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            error_suffix: ERROR_QUEUE_SUFFIX.to_string(),
        }
    }
}

impl QueueConfig {
    pub fn error_queue(&self) -> String {
        lq_common::error_queue_key(&self.name, &self.error_suffix)
    }
}

/// Generator lease configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaseConfig {
    pub key: String,
    pub ttl_seconds: u64,
    /// Consumer pops between liveness checks
    pub check_every_cycles: u32,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_LEASE_KEY.to_string(),
            ttl_seconds: DEFAULT_LEASE_TTL_SECONDS,
            check_every_cycles: DEFAULT_CHECK_EVERY_CYCLES,
        }
    }
}

/// Loop delays, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub generate_delay_ms: u64,
    pub receive_delay_ms: u64,
    pub empty_retry_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            generate_delay_ms: 500,
            receive_delay_ms: 200,
            empty_retry_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn generate_delay(&self) -> Duration {
        Duration::from_millis(self.generate_delay_ms)
    }

    pub fn receive_delay(&self) -> Duration {
        Duration::from_millis(self.receive_delay_ms)
    }

    pub fn empty_retry_delay(&self) -> Duration {
        Duration::from_millis(self.empty_retry_delay_ms)
    }
}

/// Simulated processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// One in this many messages fails processing; 0 disables failures
    pub failure_one_in: u32,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { failure_one_in: 20 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check cross-field constraints.
    ///
    /// The generator renews the lease once per generate delay, so the TTL has to
    /// cover at least two renewals or a healthy generator could lose its lease.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.name.is_empty() {
            return Err(ConfigError::ValidationError("queue.name must not be empty".to_string()));
        }
        if self.lease.key.is_empty() {
            return Err(ConfigError::ValidationError("lease.key must not be empty".to_string()));
        }
        if self.lease.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError("lease.ttl_seconds must be positive".to_string()));
        }
        if i64::try_from(self.lease.ttl_seconds).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "lease.ttl_seconds ({}) exceeds the largest EXPIRE value {}",
                self.lease.ttl_seconds,
                i64::MAX
            )));
        }
        if self.lease.check_every_cycles == 0 {
            return Err(ConfigError::ValidationError(
                "lease.check_every_cycles must be positive".to_string(),
            ));
        }

        let ttl_ms = self.lease.ttl_seconds.saturating_mul(1000);
        if ttl_ms <= self.timing.generate_delay_ms.saturating_mul(2) {
            return Err(ConfigError::ValidationError(format!(
                "lease.ttl_seconds ({}s) must exceed twice timing.generate_delay_ms ({}ms)",
                self.lease.ttl_seconds, self.timing.generate_delay_ms
            )));
        }

        Ok(())
    }

    /// Return the configured instance id, generating one if unset
    pub fn resolved_instance_id(&self) -> String {
        if self.instance_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            self.instance_id.clone()
        }
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# LeaseQueue Configuration
# Environment variables (LEASEQUEUE_*) override these settings

[redis]
url = "redis://127.0.0.1:6379"

[queue]
name = "messages"
error_suffix = "-Errors"

[lease]
key = "Last_time_generator_was_alive"
ttl_seconds = 10
check_every_cycles = 10

[timing]
generate_delay_ms = 500
receive_delay_ms = 200
empty_retry_delay_ms = 1000

[processing]
failure_one_in = 20

instance_id = ""
"#
        .to_string()
    }
}
