//! Prefetch window arithmetic and partitioning for the paged cursor.

use crate::statement::RowWindow;

// == Fetch Window ==
/// Rows to request for `page_index`.
///
/// Page 0 fetches two pages (current + next); any later page fetches three
/// (previous + current + next), starting one page before the target.
/// Offsets past `usize::MAX` saturate, which reads as a page past the end.
pub fn fetch_window(page_index: usize, page_size: usize) -> RowWindow {
    match page_index.checked_sub(1) {
        None => RowWindow::new(0, page_size.saturating_mul(2)),
        Some(previous) => RowWindow::new(
            previous.saturating_mul(page_size),
            page_size.saturating_mul(3),
        ),
    }
}

// == Page Window ==
/// Rows of one fetch, split around the requested page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow<R> {
    pub previous: Option<Vec<R>>,
    pub current: Vec<R>,
    pub next: Option<Vec<R>>,
}

impl<R> Default for PageWindow<R> {
    fn default() -> Self {
        Self {
            previous: None,
            current: Vec::new(),
            next: None,
        }
    }
}

impl<R> PageWindow<R> {
    // == Partition ==
    /// Splits the rows fetched with [`fetch_window`] for `page_index`.
    ///
    /// A short fetch is not an error: it is what tells the cursor that there
    /// is no next page, or that the requested page lies past the end.
    pub fn partition(mut rows: Vec<R>, page_index: usize, page_size: usize) -> Self {
        let total = rows.len();
        if total == 0 {
            return Self::default();
        }

        if page_index == 0 {
            if total <= page_size {
                return Self {
                    previous: None,
                    current: rows,
                    next: None,
                };
            }
            let next = rows.split_off(page_size);
            return Self {
                previous: None,
                current: rows,
                next: Some(next),
            };
        }

        if total <= page_size {
            return Self {
                previous: Some(rows),
                current: Vec::new(),
                next: None,
            };
        }

        let mut current = rows.split_off(page_size);
        let next = (current.len() > page_size).then(|| current.split_off(page_size));
        Self {
            previous: Some(rows),
            current,
            next,
        }
    }
}
