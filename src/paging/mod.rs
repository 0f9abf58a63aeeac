//! Paging Module
//!
//! Offset/limit pagination that infers first, middle and last pages from an
//! over-sized prefetch window instead of a row count.

mod cursor;
mod window;

pub use cursor::{BoxedRowDelegate, PageChangedCallback, PagedCursor};
pub use window::{fetch_window, PageWindow};
