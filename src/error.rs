//! Error types for the mapper runtime
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Mapper Error Enum ==
/// Unified error type for caches, paging and lazy loading.
#[derive(Error, Debug)]
pub enum MapperError {
    /// Operation deliberately not offered by this API (e.g. `CacheStore::add`)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Invalid setup of a cache, cursor or lazy load
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown cache model or registry entry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cached value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure reported by the statement executor or connection manager,
    /// passed through unchanged
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the mapper runtime.
pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_is_transparent() {
        let err: MapperError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.to_string(), "connection reset");
        assert!(matches!(err, MapperError::Execution(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = MapperError::UnsupportedOperation("add".to_string());
        assert_eq!(err.to_string(), "Unsupported operation: add");

        let err = MapperError::Configuration("page size must be positive".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
