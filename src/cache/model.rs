//! Cache Model Module
//!
//! A named result cache as declared in a mapping: implementation, size, flush
//! interval and the statements whose execution flushes it.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheStats, CacheStore, DEFAULT_CACHE_SIZE};
use crate::error::Result;

// == Cache Kind ==
/// Cache implementation selected by a model declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum CacheKind {
    /// Application cache over the shared backing store
    #[default]
    Basic,
    Fifo,
    Lru,
    /// Implementation registered by name in the cache registry
    Custom(String),
}

impl CacheKind {
    /// Lower-case name used for registry lookups.
    pub fn name(&self) -> &str {
        match self {
            CacheKind::Basic => "basic",
            CacheKind::Fifo => "fifo",
            CacheKind::Lru => "lru",
            CacheKind::Custom(name) => name,
        }
    }
}

impl From<String> for CacheKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "basic" => CacheKind::Basic,
            "fifo" => CacheKind::Fifo,
            "lru" => CacheKind::Lru,
            other => CacheKind::Custom(other.to_string()),
        }
    }
}

impl FromStr for CacheKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(CacheKind::from(s.to_string()))
    }
}

// == Flush Interval ==
/// Flush interval declared as a sum of units, or an explicit duration in
/// seconds which overrides the units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlushInterval {
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
    pub days: u64,
    pub duration: Option<u64>,
}

impl FlushInterval {
    pub fn from_secs(secs: u64) -> Self {
        Self {
            duration: Some(secs),
            ..Self::default()
        }
    }

    /// Total interval, `None` when it adds up to zero. Sums that do not fit
    /// in a `u64` of seconds saturate.
    pub fn as_duration(&self) -> Option<Duration> {
        let secs = self.duration.unwrap_or_else(|| {
            self.seconds
                .saturating_add(self.minutes.saturating_mul(60))
                .saturating_add(self.hours.saturating_mul(3_600))
                .saturating_add(self.days.saturating_mul(86_400))
        });
        (secs > 0).then(|| Duration::from_secs(secs))
    }
}

fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

// == Cache Model Config ==
/// Declaration of one cache model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheModelConfig {
    pub id: String,
    #[serde(default)]
    pub implementation: CacheKind,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default)]
    pub flush_interval: FlushInterval,
    /// Statement ids whose execution flushes this model
    #[serde(default)]
    pub flush_on_execute: Vec<String>,
}

impl CacheModelConfig {
    pub fn new(id: impl Into<String>, implementation: CacheKind) -> Self {
        Self {
            id: id.into(),
            implementation,
            cache_size: DEFAULT_CACHE_SIZE,
            flush_interval: FlushInterval::default(),
            flush_on_execute: Vec::new(),
        }
    }

    /// Applies the runtime defaults from [`crate::Config`].
    pub fn with_defaults(mut self, config: &crate::Config) -> Self {
        self.cache_size = config.cache_size;
        self.flush_interval = FlushInterval::from_secs(config.flush_interval);
        self
    }

    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn flush_interval(mut self, interval: FlushInterval) -> Self {
        self.flush_interval = interval;
        self
    }

    pub fn flush_on_execute(mut self, statement_id: impl Into<String>) -> Self {
        self.flush_on_execute.push(statement_id.into());
        self
    }
}

// == Cache Model ==
/// A result cache with request statistics and interval flushing.
pub struct CacheModel<V> {
    id: String,
    kind: CacheKind,
    cache: Box<dyn CacheStore<V> + Send>,
    flush_interval: Option<Duration>,
    last_flush: Instant,
    stats: CacheStats,
}

impl<V> CacheModel<V> {
    pub fn new(
        id: impl Into<String>,
        kind: CacheKind,
        cache: Box<dyn CacheStore<V> + Send>,
        flush_interval: Option<Duration>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            cache,
            flush_interval,
            last_flush: Instant::now(),
            stats: CacheStats::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &CacheKind {
        &self.kind
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Hits divided by requests, 0.0 before the first request.
    pub fn hit_ratio(&self) -> f64 {
        self.stats.hit_rate()
    }

    // == Get ==
    /// Looks up a cached result, flushing first if the interval has elapsed.
    pub fn get(&mut self, key: &CacheKey) -> Result<Option<V>> {
        self.flush_if_due()?;

        let value = self.cache.get(key.as_str())?;
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        Ok(value)
    }

    // == Set ==
    /// Stores a result; the flush interval doubles as the entry lifetime.
    pub fn set(&mut self, key: &CacheKey, value: V) -> Result<()> {
        self.cache
            .set(key.as_str(), value, self.flush_interval, None)
    }

    pub fn delete(&mut self, key: &CacheKey) -> Result<Option<V>> {
        self.cache.delete(key.as_str())
    }

    // == Flush ==
    pub fn flush(&mut self) -> Result<()> {
        self.cache.flush()?;
        self.last_flush = Instant::now();
        self.stats.record_flush();
        info!(model = %self.id, flushes = self.stats.flushes, "cache model flushed");
        Ok(())
    }

    fn flush_if_due(&mut self) -> Result<()> {
        if let Some(interval) = self.flush_interval {
            if self.last_flush.elapsed() >= interval {
                debug!(model = %self.id, ?interval, "flush interval elapsed");
                self.flush()?;
            }
        }
        Ok(())
    }
}

impl<V> fmt::Debug for CacheModel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheModel")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("flush_interval", &self.flush_interval)
            .field("stats", &self.stats)
            .finish()
    }
}
