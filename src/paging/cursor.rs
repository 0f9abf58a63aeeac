//! Paged Cursor Module
//!
//! Walks a statement's result set page by page using offset/limit prefetch
//! windows, so the total row count never needs to be known.

use std::sync::Arc;

use tracing::debug;

use crate::error::{MapperError, Result};
use crate::paging::{fetch_window, PageWindow};
use crate::statement::{ConnectionManager, MappedStatement, RowDelegate};

/// Row callback owned by a cursor and applied on every fetch.
pub type BoxedRowDelegate<R> = Box<RowDelegate<'static, R>>;

/// Called with `(old_index, new_index)` after the cursor moved to a new page.
pub type PageChangedCallback = Box<dyn FnMut(usize, usize)>;

// == Paged Cursor ==
/// Cursor over one page of a statement's results.
///
/// Every page transition re-executes the statement with a window of two
/// (first page) or three (later pages) page sizes. The rows around the
/// current page only tell whether a previous or next page exists.
pub struct PagedCursor<S: MappedStatement, M> {
    statement: Arc<S>,
    manager: Arc<M>,
    parameter: S::Parameter,
    page_size: usize,
    current_page_index: usize,
    window: PageWindow<S::Row>,
    delegate: Option<BoxedRowDelegate<S::Row>>,
    on_page_changed: Option<PageChangedCallback>,
}

impl<S, M> PagedCursor<S, M>
where
    S: MappedStatement,
    M: ConnectionManager<Connection = S::Connection>,
{
    // == Constructor ==
    /// Opens a cursor on the first page.
    ///
    /// Fails with a configuration error when `page_size` is zero; execution
    /// errors from the first fetch are returned unchanged.
    pub fn new(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        page_size: usize,
    ) -> Result<Self> {
        Self::open(statement, manager, parameter, page_size, 0, None)
    }

    /// Opens a cursor on `start_page` with an optional row delegate.
    pub fn open(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        page_size: usize,
        start_page: usize,
        delegate: Option<BoxedRowDelegate<S::Row>>,
    ) -> Result<Self> {
        if page_size == 0 {
            return Err(MapperError::Configuration(
                "page size must be positive".to_string(),
            ));
        }

        let mut cursor = Self {
            statement,
            manager,
            parameter,
            page_size,
            current_page_index: start_page,
            window: PageWindow::default(),
            delegate,
            on_page_changed: None,
        };
        cursor.fetch(start_page)?;
        Ok(cursor)
    }

    fn fetch(&mut self, page_index: usize) -> Result<()> {
        let window = fetch_window(page_index, self.page_size);
        let mut connection = self.manager.db_connection()?;
        let rows = self.statement.execute_query_for_list(
            &mut connection,
            &self.parameter,
            Some(window),
            self.delegate.as_deref_mut(),
        )?;

        let fetched = rows.len();
        self.window = PageWindow::partition(rows, page_index, self.page_size);
        let old_index = std::mem::replace(&mut self.current_page_index, page_index);

        debug!(
            statement = self.statement.id(),
            old_index,
            new_index = page_index,
            offset = window.offset,
            limit = window.limit,
            fetched,
            "page changed"
        );
        if old_index != page_index {
            if let Some(callback) = self.on_page_changed.as_mut() {
                callback(old_index, page_index);
            }
        }
        Ok(())
    }

    // == Navigation ==
    /// Moves to `page_index`, re-executing the statement.
    ///
    /// Moving to the current page does nothing. A page past the end is not an
    /// error: it is reached with an empty current page.
    pub fn goto_page(&mut self, page_index: usize) -> Result<bool> {
        if page_index != self.current_page_index {
            self.fetch(page_index)?;
        }
        Ok(true)
    }

    /// Advances one page. Returns `Ok(false)` without fetching when there is
    /// no next page.
    pub fn next_page(&mut self) -> Result<bool> {
        if !self.is_next_page_available() {
            return Ok(false);
        }
        self.goto_page(self.current_page_index + 1)
    }

    /// Steps back one page. Returns `Ok(false)` without fetching when there is
    /// no previous page.
    pub fn previous_page(&mut self) -> Result<bool> {
        if !self.is_previous_page_available() || self.current_page_index == 0 {
            return Ok(false);
        }
        self.goto_page(self.current_page_index - 1)
    }

    /// Offset paging is the only mode this cursor supports.
    ///
    /// Enabling it is a no-op; disabling it fails with a configuration error.
    pub fn set_custom_paging(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            return Ok(());
        }
        Err(MapperError::Configuration(format!(
            "paged cursor over '{}' requires custom (offset) paging",
            self.statement.id()
        )))
    }

    pub fn custom_paging(&self) -> bool {
        true
    }

    /// Replaces the row delegate used by subsequent fetches.
    pub fn set_row_delegate(&mut self, delegate: Option<BoxedRowDelegate<S::Row>>) {
        self.delegate = delegate;
    }

    /// Replaces the callback run after each successful page transition.
    pub fn set_page_changed_callback(&mut self, callback: Option<PageChangedCallback>) {
        self.on_page_changed = callback;
    }

    // == State ==
    pub fn is_next_page_available(&self) -> bool {
        self.window.next.is_some()
    }

    pub fn is_previous_page_available(&self) -> bool {
        self.window.previous.is_some()
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page_index == 0
    }

    pub fn is_last_page(&self) -> bool {
        self.window.next.as_ref().map_or(true, |next| next.is_empty())
    }

    pub fn is_middle_page(&self) -> bool {
        !(self.is_first_page() || self.is_last_page())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    /// Rows of the current page.
    pub fn current_page(&self) -> &[S::Row] {
        &self.window.current
    }

    /// Prefetched rows before the current page, if any were fetched.
    pub fn previous_rows(&self) -> Option<&[S::Row]> {
        self.window.previous.as_deref()
    }

    /// Prefetched rows after the current page, if any were fetched.
    pub fn next_rows(&self) -> Option<&[S::Row]> {
        self.window.next.as_deref()
    }

    pub fn len(&self) -> usize {
        self.window.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.current.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, S::Row> {
        self.window.current.iter()
    }

    pub fn parameter(&self) -> &S::Parameter {
        &self.parameter
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{MemoryConnectionManager, VecStatement};
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Cursor = PagedCursor<VecStatement<i32>, MemoryConnectionManager>;

    fn setup(total: i32) -> (Arc<VecStatement<i32>>, Arc<MemoryConnectionManager>) {
        (
            Arc::new(VecStatement::new("SelectRows", (0..total).collect())),
            Arc::new(MemoryConnectionManager::new()),
        )
    }

    fn cursor(total: i32, page_size: usize) -> (Arc<VecStatement<i32>>, Cursor) {
        let (statement, manager) = setup(total);
        let cursor = PagedCursor::new(statement.clone(), manager, Value::Null, page_size).unwrap();
        (statement, cursor)
    }

    fn range(r: std::ops::Range<i32>) -> Vec<i32> {
        r.collect()
    }

    #[test]
    fn test_walk_twenty_five_rows() {
        let (_, mut cursor) = cursor(25, 10);

        // Page 0: window of 20
        assert_eq!(cursor.current_page(), range(0..10).as_slice());
        assert_eq!(cursor.next_rows(), Some(range(10..20).as_slice()));
        assert!(cursor.is_first_page());
        assert!(cursor.is_next_page_available());
        assert!(!cursor.is_previous_page_available());

        // Page 1: window of 30 from offset 0
        assert!(cursor.next_page().unwrap());
        assert_eq!(cursor.previous_rows(), Some(range(0..10).as_slice()));
        assert_eq!(cursor.current_page(), range(10..20).as_slice());
        assert_eq!(cursor.next_rows(), Some(range(20..25).as_slice()));
        assert!(cursor.is_middle_page());

        // Page 2: window of 30 from offset 10
        assert!(cursor.next_page().unwrap());
        assert_eq!(cursor.previous_rows(), Some(range(10..20).as_slice()));
        assert_eq!(cursor.current_page(), range(20..25).as_slice());
        assert!(cursor.next_rows().is_none());
        assert!(cursor.is_last_page());
        assert!(!cursor.is_middle_page());
    }

    #[test]
    fn test_next_page_at_end_does_not_fetch() {
        let (statement, mut cursor) = cursor(5, 10);
        assert!(cursor.is_last_page());
        assert_eq!(statement.executions(), 1);

        assert!(!cursor.next_page().unwrap());
        assert_eq!(cursor.current_page_index(), 0);
        assert_eq!(statement.executions(), 1);
    }

    #[test]
    fn test_previous_page_on_first_page() {
        let (statement, mut cursor) = cursor(30, 10);
        assert!(!cursor.previous_page().unwrap());
        assert_eq!(statement.executions(), 1);
    }

    #[test]
    fn test_previous_page_walks_back() {
        let (_, mut cursor) = cursor(25, 10);
        cursor.goto_page(2).unwrap();

        assert!(cursor.previous_page().unwrap());
        assert_eq!(cursor.current_page_index(), 1);
        assert_eq!(cursor.current_page(), range(10..20).as_slice());

        assert!(cursor.previous_page().unwrap());
        assert!(cursor.is_first_page());
        assert_eq!(cursor.current_page(), range(0..10).as_slice());
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let (_, mut cursor) = cursor(20, 10);
        assert!(cursor.is_next_page_available());

        assert!(cursor.next_page().unwrap());
        assert_eq!(cursor.current_page(), range(10..20).as_slice());
        assert!(cursor.is_last_page());
        assert!(!cursor.next_page().unwrap());
    }

    #[test]
    fn test_goto_page_past_the_end() {
        let (_, mut cursor) = cursor(25, 10);

        assert!(cursor.goto_page(7).unwrap());
        assert!(cursor.is_empty());
        assert!(cursor.previous_rows().is_none());
        assert!(cursor.is_last_page());
    }

    #[test]
    fn test_goto_huge_page_is_empty() {
        let (statement, mut cursor) = cursor(25, 10);

        assert!(cursor.goto_page(usize::MAX / 4).unwrap());
        assert_eq!(cursor.current_page_index(), usize::MAX / 4);
        assert!(cursor.is_empty());
        assert!(cursor.is_last_page());
        assert!(!cursor.next_page().unwrap());

        assert!(cursor.goto_page(usize::MAX).unwrap());
        assert!(cursor.is_empty());
        assert_eq!(statement.executions(), 3);
    }

    #[test]
    fn test_goto_page_just_past_the_end() {
        let (_, mut cursor) = cursor(25, 10);

        // offset 20, five rows left: all of them are the previous page
        cursor.goto_page(3).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(cursor.previous_rows(), Some(range(20..25).as_slice()));
        assert!(cursor.is_previous_page_available());
    }

    #[test]
    fn test_goto_current_page_does_not_fetch() {
        let (statement, mut cursor) = cursor(25, 10);
        assert!(cursor.goto_page(0).unwrap());
        assert_eq!(statement.executions(), 1);
    }

    #[test]
    fn test_empty_result_set() {
        let (_, cursor) = cursor(0, 10);
        assert!(cursor.is_empty());
        assert!(cursor.is_first_page());
        assert!(cursor.is_last_page());
        assert!(!cursor.is_next_page_available());
        assert!(!cursor.is_previous_page_available());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let (statement, manager) = setup(5);
        let result = PagedCursor::new(statement, manager, Value::Null, 0);
        assert!(matches!(result, Err(MapperError::Configuration(_))));
    }

    #[test]
    fn test_custom_paging_cannot_be_disabled() {
        let (_, mut cursor) = cursor(5, 10);
        assert!(cursor.custom_paging());
        assert!(cursor.set_custom_paging(true).is_ok());
        assert!(matches!(
            cursor.set_custom_paging(false),
            Err(MapperError::Configuration(_))
        ));
    }

    #[test]
    fn test_execution_error_keeps_current_page() {
        let (statement, mut cursor) = cursor(25, 10);

        statement.fail_next(1);
        assert!(matches!(cursor.next_page(), Err(MapperError::Execution(_))));
        assert_eq!(cursor.current_page_index(), 0);
        assert_eq!(cursor.current_page(), range(0..10).as_slice());

        assert!(cursor.next_page().unwrap());
        assert_eq!(cursor.current_page_index(), 1);
    }

    #[test]
    fn test_first_fetch_error_is_returned() {
        let statement = Arc::new(VecStatement::new("SelectRows", vec![1, 2, 3]).failing(1));
        let manager = Arc::new(MemoryConnectionManager::new());

        let result = PagedCursor::new(statement, manager, Value::Null, 10);
        assert!(matches!(result, Err(MapperError::Execution(_))));
    }

    #[test]
    fn test_open_on_later_page_with_delegate() {
        let (statement, manager) = setup(25);
        let delegate: BoxedRowDelegate<i32> = Box::new(|row: &mut i32| *row += 100);
        let cursor =
            PagedCursor::open(statement, manager, Value::Null, 10, 1, Some(delegate)).unwrap();

        assert_eq!(cursor.current_page_index(), 1);
        assert_eq!(cursor.current_page(), range(110..120).as_slice());
        assert_eq!(cursor.iter().count(), 10);
    }

    #[test]
    fn test_page_changed_callback_fires_on_real_transitions() {
        let (statement, mut cursor) = cursor(25, 10);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&changes);
        cursor.set_page_changed_callback(Some(Box::new(move |old, new| {
            recorded.borrow_mut().push((old, new));
        })));

        assert!(cursor.next_page().unwrap());
        assert!(cursor.goto_page(1).unwrap());

        statement.fail_next(1);
        assert!(cursor.next_page().is_err());

        assert!(cursor.next_page().unwrap());
        assert!(cursor.previous_page().unwrap());
        assert_eq!(*changes.borrow(), vec![(0, 1), (1, 2), (2, 1)]);

        cursor.set_page_changed_callback(None);
        assert!(cursor.goto_page(0).unwrap());
        assert_eq!(changes.borrow().len(), 3);
    }
}
