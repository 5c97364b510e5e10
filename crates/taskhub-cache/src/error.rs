//! Cache errors

use thiserror::Error;

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis error
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
