//! Caching Statement Module
//!
//! Decorates a mapped statement with a cache model lookup.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheKey, SharedCacheModel};
use crate::error::Result;
use crate::statement::{MappedStatement, ResultContainer, RowDelegate, RowWindow};

// == Caching Statement ==
/// Statement that serves repeated executions from a cache model.
///
/// Results are keyed by statement id, parameter and window. On a miss the
/// inner statement runs (with the row delegate) and its rows are stored;
/// on a hit the delegate is not invoked.
pub struct CachingStatement<S: MappedStatement> {
    inner: S,
    cache: SharedCacheModel<Vec<S::Row>>,
}

impl<S: MappedStatement> CachingStatement<S> {
    pub fn new(inner: S, cache: SharedCacheModel<Vec<S::Row>>) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &SharedCacheModel<Vec<S::Row>> {
        &self.cache
    }
}

impl<S> MappedStatement for CachingStatement<S>
where
    S: MappedStatement,
    S::Parameter: Serialize,
    S::Row: Clone + Serialize + DeserializeOwned,
{
    type Connection = S::Connection;
    type Parameter = S::Parameter;
    type Row = S::Row;

    fn id(&self) -> &str {
        self.inner.id()
    }

    fn result_container(&self) -> ResultContainer {
        self.inner.result_container()
    }

    fn execute_query_for_list(
        &self,
        connection: &mut Self::Connection,
        parameter: &Self::Parameter,
        window: Option<RowWindow>,
        delegate: Option<&mut RowDelegate<'_, Self::Row>>,
    ) -> Result<Vec<Self::Row>> {
        let key = CacheKey::new(self.inner.id(), parameter, window)?;

        if let Some(rows) = self.cache.lock().get(&key)? {
            debug!(statement = self.inner.id(), "served from cache");
            return Ok(rows);
        }

        let rows = self
            .inner
            .execute_query_for_list(connection, parameter, window, delegate)?;
        self.cache.lock().set(&key, rows.clone())?;
        Ok(rows)
    }
}
