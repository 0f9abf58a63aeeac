//! Cache Dependency Module
//!
//! Invalidation conditions attached to backing cache entries.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// == Cache Dependency ==
/// Condition that invalidates a cached entry once it reports a change.
pub trait CacheDependency: fmt::Debug + Send + Sync {
    /// Returns true when the entry depending on this condition is stale.
    fn has_changed(&self) -> bool;
}

// == File Dependency ==
/// Invalidates an entry when a file's modification time changes.
///
/// A file that disappears (or appears) after the dependency was created also
/// counts as a change.
#[derive(Debug, Clone)]
pub struct FileDependency {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl FileDependency {
    /// Snapshots the current modification time of `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let modified = modified_time(&path);
        Self { path, modified }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheDependency for FileDependency {
    fn has_changed(&self) -> bool {
        modified_time(&self.path) != self.modified
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
