//! Statement Module
//!
//! Narrow interfaces to the statement executor and connection manager, which
//! live outside this crate, plus in-memory implementations and a caching
//! decorator.

mod caching;
mod memory;

pub use caching::CachingStatement;
pub use memory::{MemoryConnection, MemoryConnectionManager, VecStatement};

use crate::error::Result;

// == Row Window ==
/// Strict offset/limit window over a logical result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub offset: usize,
    pub limit: usize,
}

impl RowWindow {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Exclusive end position of the window.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }
}

// == Result Container ==
/// Container a statement declares for its list results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultContainer {
    /// Plain row list
    List,
    /// Named collection type
    Object(String),
    /// Primitive type name, which cannot hold a row collection
    Scalar(String),
}

impl ResultContainer {
    pub fn is_object(&self) -> bool {
        !matches!(self, ResultContainer::Scalar(_))
    }
}

/// Per-row callback run by the executor while it builds a result list.
pub type RowDelegate<'a, R> = dyn FnMut(&mut R) + 'a;

// == Mapped Statement ==
/// A parameterized query that can be executed for a list of rows.
pub trait MappedStatement {
    type Connection;
    type Parameter;
    type Row;

    /// Statement id, unique within a mapping.
    fn id(&self) -> &str;

    /// Declared result container, a list unless overridden.
    fn result_container(&self) -> ResultContainer {
        ResultContainer::List
    }

    /// Runs the query and returns its rows.
    ///
    /// # Arguments
    /// * `connection` - Connection obtained from the connection manager
    /// * `parameter` - Query argument
    /// * `window` - When present, only rows inside the window are returned
    /// * `delegate` - Optional callback invoked on every returned row
    fn execute_query_for_list(
        &self,
        connection: &mut Self::Connection,
        parameter: &Self::Parameter,
        window: Option<RowWindow>,
        delegate: Option<&mut RowDelegate<'_, Self::Row>>,
    ) -> Result<Vec<Self::Row>>;
}

// == Connection Manager ==
/// Hands out database connections; callers only pass them through.
pub trait ConnectionManager {
    type Connection;

    fn db_connection(&self) -> Result<Self::Connection>;
}
