//! Taskhub Cache - Pass-through key-value cache layer
//!
//! Thin wrapper over a managed cache store (Redis in production, an
//! in-memory map in tests and cache-less deployments). Everything the
//! services cache goes through the [`Store`] trait: serialized values,
//! fixed-window rate-limit counters, verification codes, the JWT logout
//! blacklist and short payment locks.

pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::CacheError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::Store;
