//! LeaseQueue Worker
//!
//! Every instance runs exactly one of two loops against the shared store:
//!
//! - **Generator**: renews the lease and pushes a message every cycle
//! - **Consumer**: pops and processes messages, and every N cycles probes the
//!   lease; a consumer that claims an absent lease becomes the generator for
//!   the rest of its life
//!
//! A third mode, [`ErrorSink::drain`], empties the error list and exits.
//!
//! Steps never block: each returns a [`Schedule`] and the [`Instance`] runner
//! awaits the timer before the next one.

mod consumer;
mod error;
mod error_sink;
mod generator;
mod instance;
mod processor;
mod state;

pub use consumer::{Consumer, ConsumerConfig};
pub use error::{Result, WorkerError};
pub use error_sink::ErrorSink;
pub use generator::{build_message, Generator};
pub use instance::{Instance, WorkerConfig};
pub use processor::{MessageProcessor, ProcessingError, SimulatedProcessor};
pub use state::{InstanceState, Role, Schedule, StopHandle};
