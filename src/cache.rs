//! Best-effort key/value cache sitting in front of the entity store.
//!
//! The cache is injected as an explicit dependency. Callers absorb every
//! cache failure: a degraded or absent cache slows reads down, it never
//! fails them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::model::VersionKey;

/// A cache-layer failure. Never surfaced to store callers.
#[derive(Debug, thiserror::Error)]
#[error("cache: {0}")]
pub struct CacheError(pub String);

/// Shared best-effort cache contract: eventual visibility within the TTL
/// window, no atomicity across keys.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a serialized value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a serialized value with an expiry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Drop a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache key for one (component, locale, stage) translation.
pub fn translation_key(key: &VersionKey) -> String {
    format!(
        "translation:{}:{}:{}",
        key.component, key.locale, key.stage
    )
}

/// Coarse cache key for a component record.
pub fn component_key(component: Uuid) -> String {
    format!("component:{}", component)
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process TTL cache backed by a mutex-guarded map.
///
/// Expired entries are evicted lazily on read.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Null cache for environments without one: every read is a miss, every
/// write succeeds and stores nothing.
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
