//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "leasequeue.toml",
    "config.toml",
    "./config/config.toml",
    "/etc/leasequeue/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found), apply environment overrides, validate
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file()? {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |name| env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// A path named explicitly (argument or `LEASEQUEUE_CONFIG`) must exist;
    /// only the standard search paths are optional.
    fn find_config_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        let explicit = self
            .config_path
            .clone()
            .or_else(|| env::var("LEASEQUEUE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Some(path));
        }

        Ok(CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `LEASEQUEUE_*` overrides read through `lookup`.
///
/// Unparseable numeric values are ignored and leave the file/default value in place.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Redis
    if let Some(val) = lookup("LEASEQUEUE_REDIS_URL") {
        config.redis.url = val;
    }

    // Queue
    if let Some(val) = lookup("LEASEQUEUE_QUEUE_NAME") {
        config.queue.name = val;
    }
    if let Some(val) = lookup("LEASEQUEUE_ERROR_SUFFIX") {
        config.queue.error_suffix = val;
    }

    // Lease
    if let Some(val) = lookup("LEASEQUEUE_LEASE_KEY") {
        config.lease.key = val;
    }
    if let Some(ttl) = lookup("LEASEQUEUE_LEASE_TTL").and_then(|v| v.parse().ok()) {
        config.lease.ttl_seconds = ttl;
    }
    if let Some(cycles) = lookup("LEASEQUEUE_CHECK_EVERY").and_then(|v| v.parse().ok()) {
        config.lease.check_every_cycles = cycles;
    }

    // Timing
    if let Some(ms) = lookup("LEASEQUEUE_GENERATE_DELAY_MS").and_then(|v| v.parse().ok()) {
        config.timing.generate_delay_ms = ms;
    }
    if let Some(ms) = lookup("LEASEQUEUE_RECEIVE_DELAY_MS").and_then(|v| v.parse().ok()) {
        config.timing.receive_delay_ms = ms;
    }
    if let Some(ms) = lookup("LEASEQUEUE_EMPTY_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
        config.timing.empty_retry_delay_ms = ms;
    }

    // Processing
    if let Some(n) = lookup("LEASEQUEUE_FAILURE_ONE_IN").and_then(|v| v.parse().ok()) {
        config.processing.failure_one_in = n;
    }

    if let Some(val) = lookup("LEASEQUEUE_INSTANCE_ID") {
        config.instance_id = val;
    }
}
