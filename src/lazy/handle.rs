//! Lazy List Module
//!
//! Handle that stands in for a related collection until first use, plus the
//! `Relation` an owning object keeps it in.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::lazy::deferred::check_container;
use crate::lazy::{Collection, DeferredLoad, WriteBack};
use crate::statement::{ConnectionManager, MappedStatement};

// == Lazy List ==
/// Cloneable proxy over a `DeferredLoad`.
///
/// Every read goes through `ensure_loaded` first, so the statement runs on
/// the first read and never again. Clones share the same load.
pub struct LazyList<S: MappedStatement, M, C> {
    load: Rc<DeferredLoad<S, M, C>>,
}

impl<S: MappedStatement, M, C> Clone for LazyList<S, M, C> {
    fn clone(&self) -> Self {
        Self {
            load: Rc::clone(&self.load),
        }
    }
}

impl<S, M, C> LazyList<S, M, C>
where
    S: MappedStatement,
    M: ConnectionManager<Connection = S::Connection>,
    C: Collection<Item = S::Row> + FromIterator<S::Row>,
{
    pub fn new(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        property: impl Into<String>,
        write_back: WriteBack<C>,
    ) -> Result<Self> {
        let load = DeferredLoad::new(statement, manager, parameter, property, write_back)?;
        Ok(Self {
            load: Rc::new(load),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.load.is_loaded()
    }

    pub fn property(&self) -> &str {
        self.load.property()
    }

    /// Loads if needed and returns the shared collection.
    pub fn resolve(&self) -> Result<Rc<C>> {
        self.load.ensure_loaded().map(Rc::clone)
    }

    /// Runs `f` against the loaded collection.
    pub fn with<T>(&self, f: impl FnOnce(&C) -> T) -> Result<T> {
        let loaded = self.load.ensure_loaded()?;
        Ok(f(loaded))
    }

    pub fn count(&self) -> Result<usize> {
        self.with(|c| c.count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with(|c| c.is_empty())
    }

    pub fn item_at(&self, index: usize) -> Result<Option<&S::Row>> {
        Ok(self.load.ensure_loaded()?.item_at(index))
    }

    pub fn first(&self) -> Result<Option<&S::Row>> {
        Ok(self.load.ensure_loaded()?.first())
    }

    pub fn last(&self) -> Result<Option<&S::Row>> {
        Ok(self.load.ensure_loaded()?.last())
    }

    pub fn index_of(&self, item: &S::Row) -> Result<Option<usize>>
    where
        S::Row: PartialEq,
    {
        self.with(|c| c.index_of(item))
    }

    pub fn contains(&self, item: &S::Row) -> Result<bool>
    where
        S::Row: PartialEq,
    {
        Ok(self.index_of(item)?.is_some())
    }
}

impl<S: MappedStatement, M, C> fmt::Debug for LazyList<S, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyList")
            .field("handles", &Rc::strong_count(&self.load))
            .finish_non_exhaustive()
    }
}

// == Relation ==
enum RelationState<S: MappedStatement, M, C> {
    Deferred(LazyList<S, M, C>),
    Loaded(Rc<C>),
}

/// Related collection as seen from the owning object.
///
/// Starts as a `LazyList` proxy. The first resolution, through this
/// relation or through any clone of the proxy, replaces the proxy with the
/// loaded collection, so later reads never touch the proxy. Clones of a
/// relation share that state.
pub struct Relation<S: MappedStatement, M, C> {
    state: Rc<RefCell<RelationState<S, M, C>>>,
}

impl<S, M, C> Relation<S, M, C>
where
    S: MappedStatement + 'static,
    M: ConnectionManager<Connection = S::Connection> + 'static,
    C: Collection<Item = S::Row> + FromIterator<S::Row> + 'static,
{
    /// Creates a relation that loads `statement` on first use.
    ///
    /// # Arguments
    /// * `statement` - Statement producing the related rows
    /// * `manager` - Source of the connection used at load time
    /// * `parameter` - Query argument, typically the owner's key
    /// * `property` - Name of the owner's property, for diagnostics
    ///
    /// Fails with a configuration error when the statement's result container
    /// is not an object type.
    pub fn deferred(
        statement: Arc<S>,
        manager: Arc<M>,
        parameter: S::Parameter,
        property: impl Into<String>,
    ) -> Result<Self> {
        check_container(statement.as_ref())?;
        let property = property.into();

        let state = Rc::new_cyclic(|slot: &Weak<RefCell<RelationState<S, M, C>>>| {
            let slot = slot.clone();
            let name = property.clone();
            let write_back: WriteBack<C> = Box::new(move |loaded: &Rc<C>| {
                let Some(state) = slot.upgrade() else {
                    return true;
                };
                let written = match state.try_borrow_mut() {
                    Ok(mut state) => {
                        *state = RelationState::Loaded(Rc::clone(loaded));
                        true
                    }
                    Err(_) => {
                        warn!(property = %name, "relation busy, lazy write-back retried on next use");
                        false
                    }
                };
                written
            });
            let load = DeferredLoad::from_parts(statement, manager, parameter, property, write_back);
            RefCell::new(RelationState::Deferred(LazyList { load: Rc::new(load) }))
        });

        Ok(Self { state })
    }
}

impl<S, M, C> Relation<S, M, C>
where
    S: MappedStatement,
    M: ConnectionManager<Connection = S::Connection>,
    C: Collection<Item = S::Row> + FromIterator<S::Row>,
{
    /// Relation whose collection is already known.
    pub fn from_loaded(collection: Rc<C>) -> Self {
        Self {
            state: Rc::new(RefCell::new(RelationState::Loaded(collection))),
        }
    }

    /// True once the relation holds the real collection.
    pub fn is_loaded(&self) -> bool {
        matches!(&*self.state.borrow(), RelationState::Loaded(_))
    }

    /// Returns the collection, loading it first when still deferred.
    pub fn get(&self) -> Result<Rc<C>> {
        // The state borrow ends here; resolving writes the state back
        let proxy = match &*self.state.borrow() {
            RelationState::Loaded(loaded) => return Ok(Rc::clone(loaded)),
            RelationState::Deferred(list) => list.clone(),
        };
        proxy.resolve()
    }

    pub fn loaded(&self) -> Option<Rc<C>> {
        match &*self.state.borrow() {
            RelationState::Loaded(loaded) => Some(Rc::clone(loaded)),
            RelationState::Deferred(_) => None,
        }
    }

    /// The proxy, while the relation is still deferred.
    pub fn proxy(&self) -> Option<LazyList<S, M, C>> {
        match &*self.state.borrow() {
            RelationState::Deferred(list) => Some(list.clone()),
            RelationState::Loaded(_) => None,
        }
    }
}

impl<S: MappedStatement, M, C> Clone for Relation<S, M, C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<S: MappedStatement, M, C> fmt::Debug for Relation<S, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow().as_deref() {
            Ok(RelationState::Deferred(list)) => f.debug_tuple("Deferred").field(list).finish(),
            Ok(RelationState::Loaded(_)) => f.write_str("Loaded"),
            Err(_) => f.write_str("Relation(<busy>)"),
        }
    }
}
