//! LRU Cache Module
//!
//! Bounded cache evicting the least recently used key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::store::validate_capacity;
use crate::cache::{CacheDependency, CacheStats, CacheStore, KeyOrder, DEFAULT_CACHE_SIZE};
use crate::error::Result;

// == LRU Cache ==
/// Cache ordered by recency of access.
///
/// A hit or an overwrite moves the key to the most recently used end.
/// A miss leaves the order untouched. `expire` and `dependency` are ignored.
#[derive(Debug)]
pub struct LruCache<V> {
    entries: HashMap<String, V>,
    order: KeyOrder,
    stats: CacheStats,
    capacity: usize,
}

impl<V: Clone> LruCache<V> {
    // == Constructor ==
    /// Creates an LRU cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            entries: HashMap::new(),
            order: KeyOrder::new(),
            stats: CacheStats::new(),
            capacity: validate_capacity(capacity)?,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.order.iter().cloned().collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}

impl<V: Clone> Default for LruCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: KeyOrder::new(),
            stats: CacheStats::new(),
            capacity: DEFAULT_CACHE_SIZE,
        }
    }
}

impl<V: Clone> CacheStore<V> for LruCache<V> {
    fn get(&mut self, key: &str) -> Result<Option<V>> {
        match self.entries.get(key) {
            Some(value) => {
                let value = value.clone();
                self.order.touch(key);
                self.stats.record_hit();
                Ok(Some(value))
            }
            None => {
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    fn set(
        &mut self,
        key: &str,
        value: V,
        _expire: Option<Duration>,
        _dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()> {
        if let Some(existing) = self.entries.get_mut(key) {
            *existing = value;
            self.order.touch(key);
            return Ok(());
        }

        if self.entries.len() >= self.capacity {
            if let Some(lru) = self.order.pop_front() {
                self.entries.remove(&lru);
                self.stats.record_eviction();
                debug!(key = %lru, "LRU cache evicted least recently used entry");
            }
        }

        self.entries.insert(key.to_string(), value);
        self.order.touch(key);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<Option<V>> {
        self.order.remove(key);
        Ok(self.entries.remove(key))
    }

    fn flush(&mut self) -> Result<()> {
        self.order.clear();
        self.entries.clear();
        Ok(())
    }
}
