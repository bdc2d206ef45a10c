//! Response caching with TTL support and FIFO eviction

use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::time::Instant;

mod in_flight;

pub use in_flight::InFlightRegistry;

/// Cached GET response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Request path the response belongs to
    pub path: String,
    /// Cached response body
    pub value: Value,
    /// When the entry was stored
    pub stored_at: Instant,
}

impl CacheEntry {
    pub fn new(path: String, value: Value) -> Self {
        Self {
            path,
            value,
            stored_at: Instant::now(),
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// Get age of cache entry
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

/// In-memory response cache.
///
/// Holds at most `max_size` entries. Eviction is by insertion order: the
/// entry written first goes first, no matter how recently it was read.
/// Expired entries are dropped when they are next looked up.
#[derive(Debug)]
pub struct ResponseCache {
    /// Cache storage, in insertion order
    entries: IndexMap<String, CacheEntry>,
    ttl: Duration,
    max_size: usize,
}

impl ResponseCache {
    /// Create new response cache
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            ttl,
            max_size: max_size.max(1),
        }
    }

    /// Get cached response if fresh, purging it if it has expired
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let fresh = self.entries.get(key)?.is_fresh(self.ttl);
        if fresh {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            // Remove stale entry
            self.entries.shift_remove(key);
            None
        }
    }

    /// Store a response.
    ///
    /// Overwriting a key keeps its original position. A new key evicts the
    /// oldest entries until there is room for it.
    pub fn insert(&mut self, key: String, path: String, value: Value) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = CacheEntry::new(path, value);
            return;
        }

        while self.entries.len() >= self.max_size {
            if self.entries.shift_remove_index(0).is_none() {
                break;
            }
        }
        self.entries.insert(key, CacheEntry::new(path, value));
    }

    /// Check if key is cached and fresh
    pub fn contains_fresh(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| entry.is_fresh(self.ttl))
            .unwrap_or(false)
    }

    /// Remove every entry whose request path matches
    pub fn remove_where<F>(&mut self, mut matches: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !matches(&entry.path));
        before - self.entries.len()
    }

    /// Remove a single entry
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.shift_remove(key)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let fresh_entries = self
            .entries
            .values()
            .filter(|entry| entry.is_fresh(self.ttl))
            .count();

        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            fresh_entries,
            stale_entries: self.entries.len() - fresh_entries,
            keys: self.entries.keys().cloned().collect(),
        }
    }

    /// Clear all cached entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove stale entries
    pub fn cleanup(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Total number of entries
    pub size: usize,
    /// Capacity
    pub max_size: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries not yet purged
    pub stale_entries: usize,
    /// Keys in insertion order
    pub keys: Vec<String>,
}
