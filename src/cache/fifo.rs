//! FIFO Cache Module
//!
//! Bounded cache evicting the earliest inserted key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::store::validate_capacity;
use crate::cache::{CacheDependency, CacheStats, CacheStore, KeyOrder, DEFAULT_CACHE_SIZE};
use crate::error::Result;

// == FIFO Cache ==
/// Cache whose eviction order is insertion time only.
///
/// Reads never reorder keys and overwriting a key keeps its original slot.
/// `expire` and `dependency` are accepted for interface parity and ignored.
#[derive(Debug)]
pub struct FifoCache<V> {
    entries: HashMap<String, V>,
    order: KeyOrder,
    stats: CacheStats,
    capacity: usize,
}

impl<V: Clone> FifoCache<V> {
    // == Constructor ==
    /// Creates a FIFO cache holding at most `capacity` entries.
    ///
    /// Fails with a configuration error when `capacity` is zero.
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

    /// Keys from oldest to newest.
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

impl<V: Clone> Default for FifoCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: KeyOrder::new(),
            stats: CacheStats::new(),
            capacity: DEFAULT_CACHE_SIZE,
        }
    }
}

impl<V: Clone> CacheStore<V> for FifoCache<V> {
    fn get(&mut self, key: &str) -> Result<Option<V>> {
        let value = self.entries.get(key).cloned();
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
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
            return Ok(());
        }

        // Make room before inserting a new key
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                self.stats.record_eviction();
                debug!(key = %oldest, "FIFO cache evicted oldest entry");
            }
        }

        self.entries.insert(key.to_string(), value);
        self.order.push(key);
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
