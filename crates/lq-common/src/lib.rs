//! LeaseQueue shared definitions
//!
//! Key names and defaults used by every crate that talks to the shared store,
//! plus structured logging setup for the binaries.

pub mod logging;

/// Default list key for the main message queue
pub const DEFAULT_QUEUE_NAME: &str = "messages";

/// Suffix appended to the queue name to form the error list key
pub const ERROR_QUEUE_SUFFIX: &str = "-Errors";

/// Key whose presence means a generator is alive
pub const DEFAULT_LEASE_KEY: &str = "Last_time_generator_was_alive";

/// Lease time-to-live in seconds
pub const DEFAULT_LEASE_TTL_SECONDS: u64 = 10;

/// Consumer cycles between liveness checks
pub const DEFAULT_CHECK_EVERY_CYCLES: u32 = 10;

/// Build the error list key for a queue
pub fn error_queue_key(queue_name: &str, suffix: &str) -> String {
    format!("{}{}", queue_name, suffix)
}
