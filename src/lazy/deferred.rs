//! Deferred Load Module
//!
//! The not-yet-executed query behind a lazy collection.

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::error::{MapperError, Result};
use crate::lazy::Collection;
use crate::statement::{ConnectionManager, MappedStatement};

/// Callback that stores the resolved collection on the owning object.
///
/// Returns false when the target could not be written yet; it is then kept
/// and called again on the next use of the load.
pub type WriteBack<C> = Box<dyn FnMut(&Rc<C>) -> bool>;

// == Deferred Load ==
/// Query executed at most once, on first use.
///
/// The resolved collection is kept in a `OnceCell`, so once loaded it keeps
/// the same identity for the lifetime of the load. A failed execution leaves
/// the load unresolved and the next use retries.
pub struct DeferredLoad<S: MappedStatement, M, C> {
    statement: Arc<S>,
    manager: Arc<M>,
    parameter: S::Parameter,
    property: String,
    write_back: RefCell<Option<WriteBack<C>>>,
    inner: OnceCell<Rc<C>>,
}

impl<S, M, C> DeferredLoad<S, M, C>
where
    S: MappedStatement,
    M: ConnectionManager<Connection = S::Connection>,
    C: Collection<Item = S::Row> + FromIterator<S::Row>,
{
    /// Prepares a load of `statement` for `property` of an owning object.
    ///
    /// # Arguments
    /// * `statement` - Statement producing the collection rows
    /// * `manager` - Source of the connection used at load time
    /// * `parameter` - Query argument, typically the owner's key
    /// * `property` - Name of the owner's property, for diagnostics
    /// * `write_back` - Called with the resolved collection until it succeeds
    ///
    /// Fails with a configuration error when the statement's result container
    /// is not an object type.
    pub fn new(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        property: impl Into<String>,
        write_back: WriteBack<C>,
    ) -> Result<Self> {
        check_container(statement.as_ref())?;
        Ok(Self::from_parts(statement, manager, parameter, property.into(), write_back))
    }

    /// Builds a load whose statement container was already checked.
    pub(crate) fn from_parts(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        property: String,
        write_back: WriteBack<C>,
    ) -> Self {
        Self {
            statement,
            manager,
            parameter,
            property,
            write_back: RefCell::new(Some(write_back)),
            inner: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.get().is_some()
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn statement_id(&self) -> &str {
        self.statement.id()
    }

    /// True until the write-back has reached its target.
    pub fn write_back_pending(&self) -> bool {
        self.write_back.borrow().is_some()
    }

    // == Ensure Loaded ==
    /// Executes the statement unless already resolved and returns the result.
    pub fn ensure_loaded(&self) -> Result<&Rc<C>> {
        if let Some(loaded) = self.inner.get() {
            self.deliver(loaded);
            return Ok(loaded);
        }

        let mut connection = self.manager.db_connection()?;
        let rows = self
            .statement
            .execute_query_for_list(&mut connection, &self.parameter, None, None)?;
        let collection: C = rows.into_iter().collect();
        let loaded = self.inner.get_or_init(|| Rc::new(collection));

        debug!(
            statement = self.statement.id(),
            property = %self.property,
            rows = loaded.count(),
            "lazy load resolved"
        );

        self.deliver(loaded);
        Ok(loaded)
    }

    fn deliver(&self, loaded: &Rc<C>) {
        // Taken before the call so a re-entrant use does not hit the RefCell
        let Some(mut write_back) = self.write_back.borrow_mut().take() else {
            return;
        };
        if !write_back(loaded) {
            debug!(property = %self.property, "lazy write-back deferred to next use");
            *self.write_back.borrow_mut() = Some(write_back);
        }
    }
}

/// Rejects statements whose result container cannot hold a row collection.
pub(crate) fn check_container<S: MappedStatement>(statement: &S) -> Result<()> {
    let container = statement.result_container();
    if container.is_object() {
        return Ok(());
    }
    Err(MapperError::Configuration(format!(
        "statement '{}' returns {:?}, lazy loading needs an object container",
        statement.id(),
        container
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{MemoryConnectionManager, ResultContainer, VecStatement};
    use serde_json::Value;
    use std::cell::Cell;

    type Load = DeferredLoad<VecStatement<u32>, MemoryConnectionManager, Vec<u32>>;

    fn load(statement: VecStatement<u32>, written: Rc<Cell<usize>>) -> Result<Load> {
        DeferredLoad::new(
            Arc::new(statement),
            Arc::new(MemoryConnectionManager::new()),
            Value::Null,
            "items",
            Box::new(move |_: &Rc<Vec<u32>>| {
                written.set(written.get() + 1);
                true
            }),
        )
    }

    #[test]
    fn test_loads_once_and_keeps_identity() {
        let written = Rc::new(Cell::new(0));
        let deferred = load(VecStatement::new("SelectItems", vec![1, 2, 3]), written.clone()).unwrap();
        assert!(!deferred.is_loaded());

        let first = Rc::clone(deferred.ensure_loaded().unwrap());
        let second = Rc::clone(deferred.ensure_loaded().unwrap());

        assert!(deferred.is_loaded());
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*first, vec![1, 2, 3]);
        assert_eq!(written.get(), 1);
        assert_eq!(deferred.property(), "items");
        assert_eq!(deferred.statement_id(), "SelectItems");
    }

    #[test]
    fn test_scalar_container_rejected() {
        let statement = VecStatement::new("CountItems", vec![3])
            .with_container(ResultContainer::Scalar("integer".to_string()));
        let result = load(statement, Rc::new(Cell::new(0)));
        assert!(matches!(result, Err(MapperError::Configuration(_))));
    }

    #[test]
    fn test_failed_load_can_retry() {
        let written = Rc::new(Cell::new(0));
        let deferred = load(VecStatement::new("SelectItems", vec![9]).failing(1), written.clone()).unwrap();

        assert!(matches!(deferred.ensure_loaded(), Err(MapperError::Execution(_))));
        assert!(!deferred.is_loaded());
        assert_eq!(written.get(), 0);

        assert_eq!(**deferred.ensure_loaded().unwrap(), vec![9]);
        assert_eq!(written.get(), 1);
    }

    #[test]
    fn test_refused_write_back_is_retried() {
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        let deferred: Load = DeferredLoad::new(
            Arc::new(VecStatement::new("SelectItems", vec![4, 5])),
            Arc::new(MemoryConnectionManager::new()),
            Value::Null,
            "items",
            Box::new(move |_: &Rc<Vec<u32>>| {
                counter.set(counter.get() + 1);
                counter.get() >= 2
            }),
        )
        .unwrap();

        deferred.ensure_loaded().unwrap();
        assert!(deferred.write_back_pending());

        deferred.ensure_loaded().unwrap();
        assert!(!deferred.write_back_pending());

        deferred.ensure_loaded().unwrap();
        assert_eq!(attempts.get(), 2);
    }
}
