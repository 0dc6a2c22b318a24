//! LeaseQueue Generator Election
//!
//! A single key in the shared store acts as the generator's lease. While the
//! key exists a generator is assumed alive; once its TTL lapses any consumer
//! may claim it.
//!
//! # Features
//!
//! - **Liveness probe**: plain EXISTS, no transaction while the lease is held
//! - **Claim**: watched transaction that sets the key with a TTL only if it is
//!   still absent, so concurrent claimants cannot both win
//! - **Renewal**: the transaction fragment a generator commits every cycle
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lq_standby::{ClaimOutcome, LeaseConfig, LeaseTracker};
//! use lq_store::RedisStore;
//!
//! async fn example() {
//!     let store = Arc::new(RedisStore::connect("redis://127.0.0.1:6379").await.unwrap());
//!     let tracker = LeaseTracker::new(LeaseConfig::default(), store);
//!
//!     if tracker.claim_or_defer().await.unwrap() == ClaimOutcome::Claimed {
//!         // Start generating
//!     }
//! }
//! ```

mod error;
mod lease;

pub use error::{Result, StandbyError};
pub use lease::{ClaimOutcome, LeaseConfig, LeaseTracker};
