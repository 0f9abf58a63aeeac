//! Backing Cache Module
//!
//! The process-wide key-value service that application caches sit on top of,
//! plus an in-process implementation with expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::cache::{BackingEntry, CacheDependency, CacheStats};
use crate::error::Result;

// == Backing Cache ==
/// Shared cache service without an enumeration API.
///
/// `get` distinguishes a miss (`None`) from any stored document, including
/// `false`, `null` or an empty array.
pub trait BackingCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(
        &self,
        key: &str,
        value: Value,
        expire: Option<Duration>,
        dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()>;

    /// Removes a key. Returns true if it was present.
    fn delete(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, BackingEntry>,
    stats: CacheStats,
}

// == Memory Cache ==
/// In-process backing cache with per-entry expiry and dependencies.
///
/// Expired entries are dropped lazily on lookup and in bulk by
/// [`MemoryCache::cleanup_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: Mutex<MemoryState>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache ready to be shared between adapters.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Checks presence without touching statistics or expiry.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - state.entries.len();
        state.stats.record_evictions(removed);
        removed
    }
}

impl BackingCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock();

        // Some(None) = present but stale
        let lookup = state
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                state.stats.record_hit();
                return Ok(Some(value));
            }
            Some(None) => {
                state.entries.remove(key);
                state.stats.record_eviction();
                debug!(key, "backing cache dropped expired entry");
            }
            None => {}
        }
        state.stats.record_miss();
        Ok(None)
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        expire: Option<Duration>,
        dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()> {
        let entry = BackingEntry::new(value, expire, dependency);
        self.state.lock().entries.insert(key.to_string(), entry);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.state.lock().entries.remove(key).is_some())
    }
}
