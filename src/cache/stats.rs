//! Cache Statistics Module
//!
//! Counters shared by the bounded stores, the backing cache and cache models.

use serde::Serialize;

// == Cache Stats ==
/// Hit, miss and eviction counters for one cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing (absent, expired or evicted)
    pub misses: u64,
    /// Entries removed by the eviction policy or by expiry
    pub evictions: u64,
    /// Whole-cache flushes (interval, trigger or explicit)
    pub flushes: u64,
    /// Current number of entries
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of lookups.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Returns hits / requests, or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.record_evictions(1);
    }

    /// Counts a batch of entries dropped at once, e.g. by an expiry sweep.
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }

    /// Clears the lookup counters, keeping the entry count.
    pub fn reset(&mut self) {
        *self = Self {
            total_entries: self.total_entries,
            ..Self::default()
        };
    }
}
