//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the runtime is up.
//!
//! # Tasks
//! - Expiry Cleanup: Removes expired backing cache entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
