//! Backing Entry Module
//!
//! Defines the entries held by the in-process backing cache.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::cache::CacheDependency;

// == Backing Entry ==
/// A single backing cache entry with value and expiry metadata.
#[derive(Clone)]
pub struct BackingEntry {
    /// The stored document
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Optional invalidation condition
    pub dependency: Option<Arc<dyn CacheDependency>>,
}

impl BackingEntry {
    // == Constructor ==
    /// Creates a new entry with optional lifetime and dependency.
    ///
    /// # Arguments
    /// * `value` - The document to store
    /// * `expire` - Optional lifetime, a zero duration means no expiration
    /// * `dependency` - Optional invalidation condition
    pub fn new(
        value: Value,
        expire: Option<Duration>,
        dependency: Option<Arc<dyn CacheDependency>>,
    ) -> Self {
        let now = current_timestamp_ms();
        let expires_at = expire
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| now.saturating_add(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)));

        Self {
            value,
            created_at: now,
            expires_at,
            dependency,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is stale.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time, or when its dependency reports a change.
    pub fn is_expired(&self) -> bool {
        let timed_out = match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        };
        timed_out || self.dependency.as_ref().is_some_and(|d| d.has_changed())
    }

    /// Returns remaining lifetime in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

impl fmt::Debug for BackingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackingEntry")
            .field("value", &self.value)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("has_dependency", &self.dependency.is_some())
            .finish()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::sleep;

    #[derive(Debug, Default)]
    struct Flag(AtomicBool);

    impl CacheDependency for Flag {
        fn has_changed(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_entry_without_expiry() {
        let entry = BackingEntry::new(json!({"id": 1}), None, None);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining_ms().is_none());
    }

    #[test]
    fn test_zero_expire_means_forever() {
        let entry = BackingEntry::new(json!(1), Some(Duration::ZERO), None);
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_huge_expire_saturates() {
        let entry = BackingEntry::new(json!(1), Some(Duration::from_secs(u64::MAX)), None);
        assert_eq!(entry.expires_at, Some(u64::MAX));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = BackingEntry::new(json!("rows"), Some(Duration::from_millis(50)), None);
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining_ms(), Some(0));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = BackingEntry {
            value: json!(null),
            created_at: now,
            expires_at: Some(now),
            dependency: None,
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_dependency_change_expires_entry() {
        let flag = Arc::new(Flag::default());
        let entry = BackingEntry::new(json!([1, 2]), None, Some(flag.clone()));
        assert!(!entry.is_expired());

        flag.0.store(true, Ordering::SeqCst);
        assert!(entry.is_expired());
    }
}
