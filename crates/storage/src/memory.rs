//! MemoryStore: in-memory relational store for collections and associations
//!
//! This module implements [`RelationalStore`] using:
//! - `FxHashMap<CollectionId, BTreeSet<EntityId>>` for membership, so every
//!   read comes back ordered by entity id
//! - `parking_lot::RwLock` for thread-safe access
//! - staged write sets per transaction, applied under one write lock at commit
//!
//! # Design Notes
//!
//! - **Read committed**: reads outside a transaction never see staged writes
//! - **Primary key**: (entity_id, collection_id) is unique; inserting an
//!   existing pair is a constraint violation, checked when staged and again
//!   at commit against rows committed in the meantime
//! - **Foreign keys**: inserted rows must reference an existing collection
//!   and entity
//! - **All-or-nothing commit**: a rejected commit applies nothing
//!
//! # Test hooks
//!
//! - `with_commit_latency` sleeps before every commit, standing in for a slow
//!   per-row insert trigger so progress can be observed
//! - `fail_nth_commit` makes one future commit fail with a storage error

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use bulkops_core::{
    Association, AssociationFilter, Collection, CollectionId, EntityId, Error, RelationalStore,
    Result, StoreTransaction,
};

#[derive(Debug, Default)]
struct Tables {
    collections: FxHashMap<CollectionId, Collection>,
    entities: BTreeMap<EntityId, String>,
    members: FxHashMap<CollectionId, BTreeSet<EntityId>>,
}

impl Tables {
    fn contains(&self, row: &Association) -> bool {
        self.members
            .get(&row.collection_id)
            .map_or(false, |members| members.contains(&row.entity_id))
    }

    fn matching(&self, filter: &AssociationFilter) -> Vec<Association> {
        let Some(members) = self.members.get(&filter.collection_id) else {
            return Vec::new();
        };
        let collection_id = filter.collection_id;
        match &filter.entity_ids {
            None => members
                .iter()
                .map(|entity| Association::new(*entity, collection_id))
                .collect(),
            // Walk the smaller side; both sets are ordered so output stays sorted
            Some(ids) if ids.len() < members.len() => ids
                .iter()
                .filter(|entity| members.contains(entity))
                .map(|entity| Association::new(*entity, collection_id))
                .collect(),
            Some(ids) => members
                .iter()
                .filter(|entity| ids.contains(entity))
                .map(|entity| Association::new(*entity, collection_id))
                .collect(),
        }
    }

    fn check_references(&self, row: &Association) -> Result<()> {
        if !self.collections.contains_key(&row.collection_id) {
            return Err(Error::constraint(format!(
                "association {} references missing collection",
                row
            )));
        }
        if !self.entities.contains_key(&row.entity_id) {
            return Err(Error::constraint(format!(
                "association {} references missing entity",
                row
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct InjectedFault {
    at_commit: u64,
    reason: String,
}

/// In-memory transactional store of collections, entities and associations
///
/// Thread-safe through `parking_lot::RwLock`; commits serialize on the write
/// lock, which is held only while one batch is applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// Commit attempts so far (successful or not)
    commits: AtomicU64,
    commit_latency: Duration,
    fault: Mutex<Option<InjectedFault>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `latency` at the start of every commit
    pub fn with_commit_latency(mut self, latency: Duration) -> Self {
        self.commit_latency = latency;
        self
    }

    /// Make the `n`-th commit from now (1-based) fail with `reason`
    ///
    /// Replaces any previously armed fault.
    pub fn fail_nth_commit(&self, n: u64, reason: impl Into<String>) {
        let at_commit = self.commits.load(Ordering::SeqCst) + n.max(1);
        *self.fault.lock() = Some(InjectedFault {
            at_commit,
            reason: reason.into(),
        });
    }

    /// Number of commit attempts so far
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Create a collection and return its id
    pub fn create_collection(&self, name: impl Into<String>) -> CollectionId {
        let collection = Collection::new(name);
        let id = collection.id;
        let mut tables = self.tables.write();
        tables.collections.insert(id, collection);
        tables.members.entry(id).or_default();
        id
    }

    /// Remove a collection together with all of its associations
    ///
    /// Returns false if the collection did not exist.
    pub fn drop_collection(&self, id: CollectionId) -> bool {
        let mut tables = self.tables.write();
        tables.members.remove(&id);
        tables.collections.remove(&id).is_some()
    }

    /// All collections, ordered by name
    pub fn collections(&self) -> Vec<Collection> {
        let tables = self.tables.read();
        let mut all: Vec<Collection> = tables.collections.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Add entities with the given names; ids continue after the highest existing id
    pub fn add_entities<I, S>(&self, names: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = self.tables.write();
        let mut next = tables
            .entities
            .keys()
            .next_back()
            .map_or(1, |last| last.get() + 1);
        let mut ids = Vec::new();
        for name in names {
            let id = EntityId(next);
            tables.entities.insert(id, name.into());
            ids.push(id);
            next += 1;
        }
        ids
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.tables.read().entities.len()
    }

    /// Associate `ids` with `collection_id` directly, outside any transaction
    ///
    /// Existing pairs are skipped. Used for seeding; bypasses latency and
    /// fault injection. Returns the number of new rows.
    pub fn associate(
        &self,
        collection_id: CollectionId,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Result<usize> {
        let mut tables = self.tables.write();
        if !tables.collections.contains_key(&collection_id) {
            return Err(Error::CollectionNotFound {
                collection: collection_id,
            });
        }
        let mut added = Vec::new();
        for entity_id in ids {
            tables.check_references(&Association::new(entity_id, collection_id))?;
            added.push(entity_id);
        }
        let members = tables.members.entry(collection_id).or_default();
        Ok(added.into_iter().filter(|id| members.insert(*id)).count())
    }

    /// Committed members of a collection
    pub fn members(&self, collection_id: CollectionId) -> BTreeSet<EntityId> {
        self.tables
            .read()
            .members
            .get(&collection_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of committed association rows
    pub fn association_count(&self) -> usize {
        self.tables.read().members.values().map(BTreeSet::len).sum()
    }

    fn take_fault(&self, attempt: u64) -> Option<String> {
        let mut fault = self.fault.lock();
        if fault.as_ref().map_or(false, |f| f.at_commit == attempt) {
            fault.take().map(|f| f.reason)
        } else {
            None
        }
    }
}

impl RelationalStore for MemoryStore {
    fn collection_exists(&self, id: CollectionId) -> Result<bool> {
        Ok(self.tables.read().collections.contains_key(&id))
    }

    fn known_entities(&self, ids: &BTreeSet<EntityId>) -> Result<BTreeSet<EntityId>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter(|id| tables.entities.contains_key(id))
            .copied()
            .collect())
    }

    fn query(&self, filter: &AssociationFilter) -> Result<Vec<Association>> {
        Ok(self.tables.read().matching(filter))
    }

    fn count(&self, filter: &AssociationFilter) -> Result<usize> {
        Ok(self.tables.read().matching(filter).len())
    }

    fn begin(&self) -> Result<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(MemoryTransaction::new(self)))
    }
}

/// A transaction against a [`MemoryStore`]
///
/// Writes are staged in two sets and applied atomically by `commit`.
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    deleted: FxHashSet<Association>,
    inserted: BTreeSet<Association>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(store: &'a MemoryStore) -> Self {
        Self {
            store,
            deleted: FxHashSet::default(),
            inserted: BTreeSet::new(),
        }
    }

    fn visible(&self, tables: &Tables, row: &Association) -> bool {
        self.inserted.contains(row) || (tables.contains(row) && !self.deleted.contains(row))
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn delete_where(&mut self, filter: &AssociationFilter) -> Result<usize> {
        let tables = self.store.tables.read();
        let mut deleted = tables
            .matching(filter)
            .into_iter()
            .filter(|row| self.deleted.insert(*row))
            .count();
        drop(tables);

        let before = self.inserted.len();
        self.inserted.retain(|row| !filter.matches(row));
        deleted += before - self.inserted.len();
        Ok(deleted)
    }

    fn bulk_insert(&mut self, rows: &[Association]) -> Result<usize> {
        let tables = self.store.tables.read();
        let mut staged = BTreeSet::new();
        for row in rows {
            tables.check_references(row)?;
            if self.visible(&tables, row) || !staged.insert(*row) {
                return Err(Error::constraint(format!(
                    "duplicate key value violates unique constraint: {}",
                    row
                )));
            }
        }
        drop(tables);

        let inserted = staged.len();
        self.inserted.extend(staged);
        Ok(inserted)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let store = self.store;
        let attempt = store.commits.fetch_add(1, Ordering::SeqCst) + 1;

        if !store.commit_latency.is_zero() {
            std::thread::sleep(store.commit_latency);
        }
        if let Some(reason) = store.take_fault(attempt) {
            debug!(target: "bulkops::storage", attempt, %reason, "Injected commit failure");
            return Err(Error::storage(reason));
        }

        let mut tables = store.tables.write();
        // Rows committed by others since staging
        for row in &self.inserted {
            tables.check_references(row)?;
            if tables.contains(row) && !self.deleted.contains(row) {
                return Err(Error::constraint(format!(
                    "duplicate key value violates unique constraint: {}",
                    row
                )));
            }
        }

        for row in &self.deleted {
            if let Some(members) = tables.members.get_mut(&row.collection_id) {
                members.remove(&row.entity_id);
            }
        }
        for row in &self.inserted {
            tables
                .members
                .entry(row.collection_id)
                .or_default()
                .insert(row.entity_id);
        }

        trace!(
            target: "bulkops::storage",
            attempt,
            deleted = self.deleted.len(),
            inserted = self.inserted.len(),
            "Committed transaction"
        );
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        trace!(
            target: "bulkops::storage",
            deleted = self.deleted.len(),
            inserted = self.inserted.len(),
            "Rolled back transaction"
        );
    }
}
