use lq_standby::StandbyError;
use lq_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lease error: {0}")]
    Lease(#[from] StandbyError),

    #[error("Generator transaction aborted for message {0}")]
    GeneratorAborted(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
