//! Configuration Module
//!
//! Handles loading runtime defaults from environment variables.

use std::env;
use std::time::Duration;

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default capacity for FIFO and LRU cache models
    pub cache_size: usize,
    /// Default number of rows per page for paged cursors
    pub page_size: usize,
    /// Default cache model flush interval in seconds (0 disables it)
    pub flush_interval: u64,
    /// Interval in seconds between sweeps of the in-process backing cache
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SQLMAP_CACHE_SIZE` - Default cache capacity (default: 100)
    /// - `SQLMAP_PAGE_SIZE` - Default page size (default: 10)
    /// - `SQLMAP_FLUSH_INTERVAL` - Cache model flush interval in seconds (default: 0)
    /// - `SQLMAP_CLEANUP_INTERVAL` - Backing cache sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_size: env_or("SQLMAP_CACHE_SIZE", defaults.cache_size),
            page_size: env_or("SQLMAP_PAGE_SIZE", defaults.page_size),
            flush_interval: env_or("SQLMAP_FLUSH_INTERVAL", defaults.flush_interval),
            cleanup_interval: env_or("SQLMAP_CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Flush interval as a duration, `None` when disabled.
    pub fn flush_interval(&self) -> Option<Duration> {
        (self.flush_interval > 0).then(|| Duration::from_secs(self.flush_interval))
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: 100,
            page_size: 10,
            flush_interval: 0,
            cleanup_interval: 1,
        }
    }
}
