use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use zipline_core::cache::Result;
use zipline_core::{CacheError, KvCache};

/// In-memory cache entry with an optional deadline.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            value: value.into(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

/// In-memory implementation of [`KvCache`] using DashMap.
///
/// Expired entries are removed lazily when a read touches them; there is
/// no background sweeper.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    /// Creates a new in-memory cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a new in-memory cache with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };

        if entry.is_expired() {
            drop(entry);
            self.entries.remove(key);
            return Ok(None);
        }

        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.entries
            .insert(key.to_owned(), CacheEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn increment(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        match self.entries.entry(key.to_owned()) {
            MapEntry::Occupied(mut occupied) if !occupied.get().is_expired() => {
                let current: i64 = occupied.get().value.parse().map_err(|_| {
                    CacheError::InvalidData(format!(
                        "cannot increment non-integer value at '{key}'"
                    ))
                })?;
                let next = current + delta;
                occupied.get_mut().value = next.to_string();
                Ok(next)
            }
            // Expired or absent: the increment creates the key.
            MapEntry::Occupied(mut occupied) => {
                *occupied.get_mut() = CacheEntry::new(delta.to_string(), ttl);
                Ok(delta)
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(CacheEntry::new(delta.to_string(), ttl));
                Ok(delta)
            }
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(false);
        };

        if entry.is_expired() {
            drop(entry);
            self.entries.remove(key);
            return Ok(false);
        }

        Ok(true)
    }
}
