//! Cache Registry Module
//!
//! Explicit context object that builds cache models, owns them by id and
//! flushes them when one of their trigger statements runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{
    ApplicationCache, BackingCache, CacheKind, CacheModel, CacheModelConfig, CacheStore,
    FifoCache, LruCache,
};
use crate::error::{MapperError, Result};

/// Cache model shared between the registry and caching statements.
pub type SharedCacheModel<V> = Arc<Mutex<CacheModel<V>>>;

/// Builds the store for a custom cache implementation.
pub type CacheFactory<V> =
    Box<dyn Fn(&CacheModelConfig) -> Result<Box<dyn CacheStore<V> + Send>> + Send + Sync>;

// == Cache Registry ==
/// Registry of cache implementations, cache models and flush triggers.
pub struct CacheRegistry<V> {
    backing: Option<Arc<dyn BackingCache>>,
    factories: HashMap<String, CacheFactory<V>>,
    models: HashMap<String, SharedCacheModel<V>>,
    /// statement id -> ids of the models it flushes
    triggers: HashMap<String, Vec<String>>,
}

impl<V> Default for CacheRegistry<V> {
    fn default() -> Self {
        Self {
            backing: None,
            factories: HashMap::new(),
            models: HashMap::new(),
            triggers: HashMap::new(),
        }
    }
}

impl<V> CacheRegistry<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    /// Creates a registry without a backing cache; `basic` models are refused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose `basic` models live in `backing`.
    pub fn with_backing(backing: Arc<dyn BackingCache>) -> Self {
        Self {
            backing: Some(backing),
            ..Self::default()
        }
    }

    /// Registers a named cache implementation.
    ///
    /// Registered names take precedence over the built-in `basic`, `fifo`
    /// and `lru` implementations.
    pub fn register_cache_type(&mut self, name: &str, factory: CacheFactory<V>) {
        self.factories.insert(name.to_ascii_lowercase(), factory);
    }

    fn build_store(&self, config: &CacheModelConfig) -> Result<Box<dyn CacheStore<V> + Send>> {
        if let Some(factory) = self.factories.get(config.implementation.name()) {
            return factory(config);
        }

        match &config.implementation {
            CacheKind::Fifo => Ok(Box::new(FifoCache::new(config.cache_size)?)),
            CacheKind::Lru => Ok(Box::new(LruCache::new(config.cache_size)?)),
            CacheKind::Basic => {
                let backing = self.backing.clone().ok_or_else(|| {
                    MapperError::Configuration(format!(
                        "cache model '{}' needs a backing cache",
                        config.id
                    ))
                })?;
                Ok(Box::new(ApplicationCache::new(backing, Some(&config.id))))
            }
            CacheKind::Custom(name) => Err(MapperError::Configuration(format!(
                "unknown cache implementation '{}' for model '{}'",
                name, config.id
            ))),
        }
    }

    // == Add Model ==
    /// Builds a cache model from its declaration and registers its triggers.
    pub fn add_model(&mut self, config: CacheModelConfig) -> Result<SharedCacheModel<V>> {
        if self.models.contains_key(&config.id) {
            return Err(MapperError::Configuration(format!(
                "duplicate cache model '{}'",
                config.id
            )));
        }

        let store = self.build_store(&config)?;
        let model = CacheModel::new(
            config.id.clone(),
            config.implementation.clone(),
            store,
            config.flush_interval.as_duration(),
        );
        let shared = Arc::new(Mutex::new(model));
        self.models.insert(config.id.clone(), shared.clone());

        for statement_id in &config.flush_on_execute {
            self.register_trigger(&config.id, statement_id)?;
        }

        info!(
            model = %config.id,
            implementation = config.implementation.name(),
            "cache model registered"
        );
        Ok(shared)
    }

    pub fn model(&self, id: &str) -> Result<SharedCacheModel<V>> {
        self.models
            .get(id)
            .cloned()
            .ok_or_else(|| MapperError::NotFound(format!("cache model '{}'", id)))
    }

    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.keys().cloned().collect();
        ids.sort();
        ids
    }

    // == Triggers ==
    /// Makes every execution of `statement_id` flush the model `model_id`.
    pub fn register_trigger(&mut self, model_id: &str, statement_id: &str) -> Result<()> {
        if !self.models.contains_key(model_id) {
            return Err(MapperError::NotFound(format!("cache model '{}'", model_id)));
        }
        let models = self.triggers.entry(statement_id.to_string()).or_default();
        if !models.iter().any(|m| m == model_id) {
            models.push(model_id.to_string());
        }
        Ok(())
    }

    /// Flushes the models triggered by `statement_id`.
    ///
    /// Returns the number of models flushed.
    pub fn statement_executed(&self, statement_id: &str) -> Result<usize> {
        let Some(model_ids) = self.triggers.get(statement_id) else {
            return Ok(0);
        };

        for id in model_ids {
            self.model(id)?.lock().flush()?;
        }
        debug!(statement = statement_id, flushed = model_ids.len(), "trigger statement ran");
        Ok(model_ids.len())
    }

    pub fn flush_all(&self) -> Result<()> {
        for model in self.models.values() {
            model.lock().flush()?;
        }
        Ok(())
    }
}
