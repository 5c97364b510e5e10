//! In-memory store
//!
//! Used by tests and as the fallback when no Redis URL is configured.
//! Expiry is checked lazily on access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::{CacheError, Store};

struct Entry {
    value: String,
    counter: i64,
    expires_at: Instant,
}

/// Mutex-guarded map with per-entry expiry stamps
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Whether the store holds no live entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                counter: 0,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.counter += 1;
                Ok(entry.counter)
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: String::new(),
                        counter: 1,
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        counter: 0,
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_del_round_trip() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let store = MemoryStore::new();
        store.set("k", "v", Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_counts_within_window() {
        let store = MemoryStore::new();
        for expected in 1..=5 {
            let count = store.incr("counter", Duration::from_secs(60)).await.unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test]
    async fn incr_resets_after_window() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("c", Duration::from_millis(5)).await.unwrap(), 1);
        assert_eq!(store.incr("c", Duration::from_millis(5)).await.unwrap(), 2);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.incr("c", Duration::from_millis(5)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_nx_is_exclusive() {
        let store = MemoryStore::new();
        assert!(store
            .set_nx("lock", "1", Duration::from_secs(10))
            .await
            .unwrap());
        assert!(!store
            .set_nx("lock", "1", Duration::from_secs(10))
            .await
            .unwrap());

        store.del("lock").await.unwrap();
        assert!(store
            .set_nx("lock", "1", Duration::from_secs(10))
            .await
            .unwrap());
    }
}
