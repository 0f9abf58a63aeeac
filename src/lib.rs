//! SqlMap Runtime - result caching, paging and lazy loading for a data mapper
//!
//! Provides FIFO, LRU and application-backed result caches, a windowed paged
//! cursor that needs no row count, and lazily loaded related collections.

pub mod cache;
pub mod config;
pub mod error;
pub mod lazy;
pub mod paging;
pub mod statement;
pub mod tasks;

pub use config::Config;
pub use error::{MapperError, Result};
pub use tasks::spawn_cleanup_task;
