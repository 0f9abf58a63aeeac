//! Expiry Cleanup Task
//!
//! Background task that periodically drops expired entries from the shared
//! backing cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns a background task that periodically removes expired backing entries.
///
/// Lookups already ignore expired entries, so the task only bounds how long
/// stale documents, including those of flushed application caches, keep
/// occupying memory.
///
/// # Arguments
/// * `cache` - Backing cache shared with the application caches
/// * `cleanup_interval_secs` - Interval in seconds between cleanup runs
///
/// # Returns
/// A JoinHandle for the spawned task, to abort it on shutdown.
///
/// # Example
/// ```ignore
/// let backing = MemoryCache::shared();
/// let cleanup_handle = spawn_cleanup_task(backing.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<MemoryCache>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting backing cache cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();

            if removed > 0 {
                info!("Cache cleanup: removed {} expired entries", removed);
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}
