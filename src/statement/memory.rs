//! In-memory statement executor and connection manager.
//!
//! Used by the binary and by tests in place of a real database.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::statement::{
    ConnectionManager, MappedStatement, ResultContainer, RowDelegate, RowWindow,
};

type RowFilter<R> = Box<dyn Fn(&R, &Value) -> bool + Send + Sync>;

// == Vec Statement ==
/// Statement over a fixed list of rows.
///
/// The parameter is a JSON document handed to an optional row filter.
/// Every execution is counted, and a number of leading executions can be
/// made to fail.
pub struct VecStatement<R> {
    id: String,
    rows: Vec<R>,
    container: ResultContainer,
    filter: Option<RowFilter<R>>,
    executions: AtomicUsize,
    failures_left: AtomicUsize,
}

impl<R: Clone> VecStatement<R> {
    pub fn new(id: impl Into<String>, rows: Vec<R>) -> Self {
        Self {
            id: id.into(),
            rows,
            container: ResultContainer::List,
            filter: None,
            executions: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
        }
    }

    /// Keeps only rows for which `filter(row, parameter)` holds.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&R, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_container(mut self, container: ResultContainer) -> Self {
        self.container = container;
        self
    }

    /// Makes the first `times` executions fail.
    pub fn failing(self, times: usize) -> Self {
        self.fail_next(times);
        self
    }

    /// Makes the next `times` executions fail.
    pub fn fail_next(&self, times: usize) {
        self.failures_left.store(times, Ordering::SeqCst);
    }

    /// Number of executions so far, failed ones included.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }
}

impl<R: Clone> MappedStatement for VecStatement<R> {
    type Connection = MemoryConnection;
    type Parameter = Value;
    type Row = R;

    fn id(&self) -> &str {
        &self.id
    }

    fn result_container(&self) -> ResultContainer {
        self.container.clone()
    }

    fn execute_query_for_list(
        &self,
        connection: &mut MemoryConnection,
        parameter: &Value,
        window: Option<RowWindow>,
        delegate: Option<&mut RowDelegate<'_, R>>,
    ) -> Result<Vec<R>> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        connection.queries += 1;

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("statement '{}' failed", self.id).into());
        }

        let (offset, limit) = match window {
            Some(w) => (w.offset, w.limit),
            None => (0, usize::MAX),
        };
        let mut rows: Vec<R> = self
            .rows
            .iter()
            .filter(|row| self.filter.as_ref().map_or(true, |f| f(row, parameter)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        if let Some(delegate) = delegate {
            rows.iter_mut().for_each(|row| delegate(row));
        }

        trace!(statement = %self.id, ?window, returned = rows.len(), "executed");
        Ok(rows)
    }
}

// == Memory Connection ==
#[derive(Debug, Default)]
pub struct MemoryConnection {
    pub id: usize,
    /// Queries run on this connection
    pub queries: usize,
}

/// Connection manager handing out numbered in-memory connections.
#[derive(Debug, Default)]
pub struct MemoryConnectionManager {
    opened: AtomicUsize,
}

impl MemoryConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl ConnectionManager for MemoryConnectionManager {
    type Connection = MemoryConnection;

    fn db_connection(&self) -> Result<MemoryConnection> {
        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MemoryConnection { id, queries: 0 })
    }
}
