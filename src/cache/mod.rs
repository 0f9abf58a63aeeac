//! Cache Module
//!
//! Result caches for mapped statements: bounded FIFO/LRU stores, an
//! application cache over a shared backing store, and the cache models and
//! registry that tie them to statements.

mod application;
mod backing;
mod dependency;
mod entry;
mod fifo;
mod key;
mod lru;
mod model;
mod order;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use application::{ApplicationCache, KEY_LIST_ID};
pub use backing::{BackingCache, MemoryCache};
pub use dependency::{CacheDependency, FileDependency};
pub use entry::BackingEntry;
pub use fifo::FifoCache;
pub use key::CacheKey;
pub use lru::LruCache;
pub use model::{CacheKind, CacheModel, CacheModelConfig, FlushInterval};
pub use order::KeyOrder;
pub use registry::{CacheFactory, CacheRegistry, SharedCacheModel};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Capacity of FIFO and LRU stores when none is configured
pub const DEFAULT_CACHE_SIZE: usize = 100;
