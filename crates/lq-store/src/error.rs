//! Error types for store access

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis connection error: {0}")]
    Connection(String),

    #[error("Redis operation error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store connection is closed")]
    Closed,

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("TTL of {0} seconds is out of range")]
    InvalidTtl(u64),
}

pub type Result<T> = std::result::Result<T, StoreError>;
