//! Lazy Loading Module
//!
//! Related collections that are fetched on first access. A `LazyList`
//! forwards every read to the collection produced by a `DeferredLoad`, and
//! writes the loaded collection back to its owner through a callback.
//!
//! Lazy handles are single-threaded (`Rc` based) and therefore not `Send`.

mod collection;
mod deferred;
mod handle;

pub use collection::Collection;
pub use deferred::{DeferredLoad, WriteBack};
pub use handle::{LazyList, Relation};
