//! Cache Store Module
//!
//! The common contract shared by every result cache implementation.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheDependency;
use crate::error::{MapperError, Result};

// == Cache Store ==
/// Key-value result cache with a bounded capacity and a pluggable eviction order.
///
/// Implementations must keep their key order and value map in step: after every
/// mutating call both hold the same keys and never more than the capacity.
pub trait CacheStore<V> {
    /// Returns the cached value, or None on a miss.
    ///
    /// Policies that track recency may reorder keys on a hit.
    fn get(&mut self, key: &str) -> Result<Option<V>>;

    /// Inserts or overwrites a value.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - The value to store
    /// * `expire` - Optional lifetime, honored by stores with expiring backends
    /// * `dependency` - Optional invalidation dependency, same caveat
    fn set(
        &mut self,
        key: &str,
        value: V,
        expire: Option<Duration>,
        dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()>;

    /// Removes an entry and returns its previous value.
    fn delete(&mut self, key: &str) -> Result<Option<V>>;

    /// Removes every entry owned by this store.
    fn flush(&mut self) -> Result<()>;

    /// Always fails: results are stored with [`CacheStore::set`].
    fn add(
        &mut self,
        key: &str,
        _value: V,
        _expire: Option<Duration>,
        _dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()> {
        Err(MapperError::UnsupportedOperation(format!(
            "use set() to store cache entries (key '{}')",
            key
        )))
    }
}

/// Rejects a zero capacity for bounded stores.
pub(crate) fn validate_capacity(capacity: usize) -> Result<usize> {
    if capacity == 0 {
        return Err(MapperError::Configuration(
            "cache capacity must be positive".to_string(),
        ));
    }
    Ok(capacity)
}
