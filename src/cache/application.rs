//! Application Cache Module
//!
//! Adapter over the process-wide backing cache that remembers which keys it
//! wrote, so that a flush only removes its own entries.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{BackingCache, CacheDependency, CacheStore};
use crate::error::Result;

/// Backing cache key holding the index of an adapter without a model id.
pub const KEY_LIST_ID: &str = "keyList";

// == Application Cache ==
/// Result cache stored in a shared [`BackingCache`].
///
/// The keys written through the adapter are tracked in a key index that lives
/// in the backing cache itself under [`ApplicationCache::key_list_id`].
/// With a model id, entries are stored under `<id>:<key>` so models sharing
/// one backing cache never read each other's results. The index holds the
/// unprefixed keys.
/// The index update is a plain read-modify-write: two adapters sharing an id
/// and writing concurrently may drop a key from the index. The entry then
/// stays in the backing cache but is no longer flushed by this adapter.
pub struct ApplicationCache<V> {
    backing: Arc<dyn BackingCache>,
    key_list_id: String,
    key_prefix: String,
    _values: PhantomData<fn() -> V>,
}

impl<V> ApplicationCache<V> {
    // == Constructor ==
    /// Creates an adapter whose key index is named after `model_id`.
    ///
    /// # Arguments
    /// * `backing` - The shared cache service
    /// * `model_id` - Optional owner id, giving the index `keyList_<id>` and
    ///   the entry prefix `<id>:`
    pub fn new(backing: Arc<dyn BackingCache>, model_id: Option<&str>) -> Self {
        let (key_list_id, key_prefix) = match model_id {
            Some(id) => (format!("{}_{}", KEY_LIST_ID, id), format!("{}:", id)),
            None => (KEY_LIST_ID.to_string(), String::new()),
        };
        Self {
            backing,
            key_list_id,
            key_prefix,
            _values: PhantomData,
        }
    }

    /// Name of the backing entry holding the key index.
    pub fn key_list_id(&self) -> &str {
        &self.key_list_id
    }

    /// Backing cache key under which `key` is stored.
    pub fn entry_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Keys currently tracked by this adapter, in insertion order.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.load_key_list()
    }

    fn load_key_list(&self) -> Result<Vec<String>> {
        match self.backing.get(&self.key_list_id)? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(Vec::new()),
        }
    }

    fn store_key_list(&self, keys: &[String]) -> Result<()> {
        let doc = serde_json::to_value(keys)?;
        self.backing.set(&self.key_list_id, doc, None, None)
    }

    fn forget_key(&self, key: &str) -> Result<bool> {
        let mut keys = self.load_key_list()?;
        match keys.iter().position(|k| k == key) {
            Some(index) => {
                keys.remove(index);
                self.store_key_list(&keys)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<V: Serialize + DeserializeOwned> CacheStore<V> for ApplicationCache<V> {
    fn get(&mut self, key: &str) -> Result<Option<V>> {
        match self.backing.get(&self.entry_key(key))? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => {
                // Expired or evicted behind our back
                if self.forget_key(key)? {
                    debug!(key, index = %self.key_list_id, "dropped stale key from index");
                }
                Ok(None)
            }
        }
    }

    fn set(
        &mut self,
        key: &str,
        value: V,
        expire: Option<Duration>,
        dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Result<()> {
        let doc = serde_json::to_value(value)?;
        self.backing.set(&self.entry_key(key), doc, expire, dependency)?;

        let mut keys = self.load_key_list()?;
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
            self.store_key_list(&keys)?;
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<Option<V>> {
        self.forget_key(key)?;
        let entry_key = self.entry_key(key);
        let previous = self.backing.get(&entry_key)?;
        self.backing.delete(&entry_key)?;
        Ok(previous.map(serde_json::from_value).transpose()?)
    }

    fn flush(&mut self) -> Result<()> {
        let keys = self.load_key_list()?;
        for key in &keys {
            self.backing.delete(&self.entry_key(key))?;
        }
        self.backing.delete(&self.key_list_id)?;
        info!(
            index = %self.key_list_id,
            removed = keys.len(),
            "application cache flushed"
        );
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::MapperError;
    use serde_json::json;
    use std::thread::sleep;

    fn adapter(backing: &Arc<MemoryCache>, id: Option<&str>) -> ApplicationCache<Vec<i64>> {
        ApplicationCache::new(backing.clone(), id)
    }

    #[test]
    fn test_key_list_id() {
        let backing = MemoryCache::shared();
        assert_eq!(adapter(&backing, None).key_list_id(), "keyList");
        assert_eq!(adapter(&backing, Some("orders")).key_list_id(), "keyList_orders");
    }

    #[test]
    fn test_set_tracks_key_once() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, Some("m"));

        cache.set("q1", vec![1, 2], None, None).unwrap();
        cache.set("q1", vec![3], None, None).unwrap();
        cache.set("q2", vec![], None, None).unwrap();

        assert_eq!(cache.keys().unwrap(), vec!["q1", "q2"]);
        assert_eq!(cache.get("q1").unwrap(), Some(vec![3]));
        assert_eq!(cache.get("q2").unwrap(), Some(vec![]));
    }

    #[test]
    fn test_flush_only_touches_own_keys() {
        let backing = MemoryCache::shared();
        backing.set("foreign", json!("keep me"), None, None).unwrap();

        let mut cache = adapter(&backing, Some("x"));
        cache.set("a", vec![1], None, None).unwrap();
        cache.set("b", vec![2], None, None).unwrap();

        cache.flush().unwrap();

        assert_eq!(backing.get("foreign").unwrap(), Some(json!("keep me")));
        assert!(!backing.contains("x:a"));
        assert!(!backing.contains("x:b"));
        assert!(!backing.contains("keyList_x"));
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_adapters_with_different_ids_are_isolated() {
        let backing = MemoryCache::shared();
        let mut first = adapter(&backing, Some("first"));
        let mut second = adapter(&backing, Some("second"));

        first.set("one", vec![1], None, None).unwrap();
        second.set("two", vec![2], None, None).unwrap();

        first.flush().unwrap();

        assert_eq!(second.get("two").unwrap(), Some(vec![2]));
        assert_eq!(first.get("one").unwrap(), None);
    }

    #[test]
    fn test_models_sharing_a_key_do_not_collide() {
        let backing = MemoryCache::shared();
        let mut orders = adapter(&backing, Some("orders"));
        let mut invoices = adapter(&backing, Some("invoices"));

        orders.set("SelectById|1", vec![1], None, None).unwrap();
        invoices.set("SelectById|1", vec![99], None, None).unwrap();

        assert_eq!(orders.get("SelectById|1").unwrap(), Some(vec![1]));
        assert_eq!(invoices.get("SelectById|1").unwrap(), Some(vec![99]));
        assert_eq!(orders.entry_key("SelectById|1"), "orders:SelectById|1");
        assert!(backing.contains("invoices:SelectById|1"));

        orders.flush().unwrap();
        assert_eq!(orders.get("SelectById|1").unwrap(), None);
        assert_eq!(invoices.get("SelectById|1").unwrap(), Some(vec![99]));
        assert_eq!(invoices.keys().unwrap(), vec!["SelectById|1"]);
    }

    #[test]
    fn test_without_model_id_keys_are_stored_as_is() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, None);

        cache.set("plain", vec![5], None, None).unwrap();
        assert_eq!(cache.entry_key("plain"), "plain");
        assert_eq!(backing.get("plain").unwrap(), Some(json!([5])));
    }

    #[test]
    fn test_miss_removes_stale_key_from_index() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, None);

        cache
            .set("short", vec![1], Some(Duration::from_millis(40)), None)
            .unwrap();
        cache.set("long", vec![2], None, None).unwrap();

        sleep(Duration::from_millis(70));

        assert_eq!(cache.get("short").unwrap(), None);
        assert_eq!(cache.keys().unwrap(), vec!["long"]);
    }

    #[test]
    fn test_stored_falsy_value_is_a_hit() {
        let backing = MemoryCache::shared();
        let mut cache: ApplicationCache<bool> = ApplicationCache::new(backing.clone(), None);

        cache.set("flag", false, None, None).unwrap();

        assert_eq!(cache.get("flag").unwrap(), Some(false));
        assert_eq!(cache.keys().unwrap(), vec!["flag"]);
    }

    #[test]
    fn test_delete_returns_value_and_untracks() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, None);

        cache.set("a", vec![7], None, None).unwrap();

        assert_eq!(cache.delete("a").unwrap(), Some(vec![7]));
        assert_eq!(cache.delete("a").unwrap(), None);
        assert!(cache.keys().unwrap().is_empty());
        assert!(!backing.contains("a"));
    }

    #[test]
    fn test_add_always_fails() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, None);

        let result = cache.add("a", vec![1], None, None);
        assert!(matches!(result, Err(MapperError::UnsupportedOperation(_))));
        assert!(backing.is_empty());
    }

    #[test]
    fn test_flush_twice_is_noop() {
        let backing = MemoryCache::shared();
        let mut cache = adapter(&backing, None);

        cache.flush().unwrap();
        cache.flush().unwrap();

        assert!(backing.is_empty());
    }

    #[test]
    fn test_type_mismatch_is_serialization_error() {
        let backing = MemoryCache::shared();
        backing.set("a", json!("text"), None, None).unwrap();

        let mut cache = adapter(&backing, None);
        assert!(matches!(cache.get("a"), Err(MapperError::Serialization(_))));
    }
}
