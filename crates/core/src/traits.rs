//! Core traits for store abstraction
//!
//! The engine never talks to a concrete database. It consumes:
//! - [`RelationalStore`]: the store of record holding associations
//! - [`StoreTransaction`]: one unit of work against it (one batch)
//! - [`StatusStore`]: the fast key/value store holding operation status
//!
//! Thread safety: store handles are shared between the accepting path and
//! background runs, so all traits require `Send + Sync`.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::Result;
use crate::types::{Association, CollectionId, EntityId};

/// Predicate over association rows: `collection = C [AND entity_id IN E]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationFilter {
    /// Collection the rows must belong to
    pub collection_id: CollectionId,
    /// If set, rows must also name one of these entities
    pub entity_ids: Option<BTreeSet<EntityId>>,
}

impl AssociationFilter {
    /// Every row of `collection_id`
    pub fn in_collection(collection_id: CollectionId) -> Self {
        Self {
            collection_id,
            entity_ids: None,
        }
    }

    /// Restrict to rows naming one of `ids`
    pub fn with_entities(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.entity_ids = Some(ids.into_iter().collect());
        self
    }

    /// Whether `row` satisfies this predicate
    pub fn matches(&self, row: &Association) -> bool {
        row.collection_id == self.collection_id
            && self
                .entity_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(&row.entity_id))
    }
}

/// Store of record for collections, entities and associations
///
/// Reads outside a transaction see committed data only.
pub trait RelationalStore: Send + Sync {
    /// Whether a collection with this id exists
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn collection_exists(&self, id: CollectionId) -> Result<bool>;

    /// The subset of `ids` that name existing entities
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn known_entities(&self, ids: &BTreeSet<EntityId>) -> Result<BTreeSet<EntityId>>;

    /// Association rows matching `filter`, ordered by entity id
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn query(&self, filter: &AssociationFilter) -> Result<Vec<Association>>;

    /// Number of rows matching `filter`
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count(&self, filter: &AssociationFilter) -> Result<usize>;

    /// Start a transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses new transactions.
    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>>;
}

/// One transaction against a [`RelationalStore`]
///
/// Writes become visible to other readers only after [`commit`](Self::commit).
/// Dropping a transaction without committing discards its writes.
pub trait StoreTransaction {
    /// Delete every row matching `filter`; returns how many were deleted
    ///
    /// # Errors
    ///
    /// Returns a store failure if the delete cannot be staged.
    fn delete_where(&mut self, filter: &AssociationFilter) -> Result<usize>;

    /// Insert `rows`; returns how many were inserted
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` if a row already exists or references a
    /// missing collection or entity.
    fn bulk_insert(&mut self, rows: &[Association]) -> Result<usize>;

    /// Make all staged writes durable and visible
    ///
    /// # Errors
    ///
    /// Returns a store failure if the commit is rejected; nothing is applied.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all staged writes
    fn rollback(self: Box<Self>);
}

/// Key/value store used for operation status
///
/// Implementations may fail; callers in the engine treat every failure as
/// degraded visibility, never as a failed mutation.
pub trait StatusStore: Send + Sync {
    /// Store `value` under `key`, readable for `ttl`
    ///
    /// # Errors
    ///
    /// Returns `StatusStoreUnavailable` if the store cannot be reached.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Read the value under `key`; `None` if absent or expired
    ///
    /// # Errors
    ///
    /// Returns `StatusStoreUnavailable` if the store cannot be reached.
    fn get(&self, key: &str) -> Result<Option<String>>;
}
