//! Error types for the standby module

use lq_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StandbyError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, StandbyError>;
