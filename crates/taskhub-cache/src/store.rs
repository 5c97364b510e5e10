//! Store trait
//!
//! Async key-value interface the rest of the system codes against.
//! Values are raw strings; callers serialize with serde_json at the
//! call site when they need structure.

use async_trait::async_trait;
use std::time::Duration;

use crate::CacheError;

/// Key-value store interface
#[async_trait]
pub trait Store: Send + Sync {
    /// Get a value
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value with a time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a key
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically increment a counter, setting `ttl` when the key is
    /// created. Returns the counter value after the increment.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Set a key only if it does not exist (lock acquisition).
    /// Returns true when the key was set by this call.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError>;
}
