//! Row set resolution
//!
//! Resolvers compute the exact association rows a mutation will touch before
//! any batch runs. They only read from the store.

use std::collections::BTreeSet;

use tracing::debug;

use bulkops_core::{
    Association, AssociationFilter, CollectionId, EntityId, Error, RelationalStore, Result,
};

/// Rows a deletion removes
pub struct DeletionResolver;

impl DeletionResolver {
    /// Associations of `collection_id`, restricted to `explicit_ids` when
    /// non-empty, ordered by entity id.
    ///
    /// The caller checks that the collection exists; an unknown collection
    /// resolves to no rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn resolve(
        store: &dyn RelationalStore,
        collection_id: CollectionId,
        explicit_ids: &[EntityId],
    ) -> Result<Vec<Association>> {
        let mut filter = AssociationFilter::in_collection(collection_id);
        if !explicit_ids.is_empty() {
            filter = filter.with_entities(explicit_ids.iter().copied());
        }
        let rows = store.query(&filter)?;
        debug!(
            target: "bulkops::service",
            collection = %collection_id,
            requested = explicit_ids.len(),
            rows = rows.len(),
            "Resolved deletion"
        );
        Ok(rows)
    }
}

/// Rows a transfer inserts, plus what was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// New `(entity, target)` rows, ordered by entity id, no duplicates
    pub rows: Vec<Association>,
    /// Distinct entities considered for the transfer
    pub candidates: usize,
    /// Candidates already in the target collection
    pub existing_in_target: usize,
}

/// Rows a transfer inserts
pub struct TransferResolver;

impl TransferResolver {
    /// Compute the rows to insert into `target`
    ///
    /// Candidates are `explicit_ids` when non-empty, else every member of
    /// `source`. Explicit ids are not required to be members of `source`,
    /// but ids that name no entity are dropped. Candidates already in
    /// `target` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if either collection is missing, or a
    /// store error if the store cannot be read.
    pub fn resolve(
        store: &dyn RelationalStore,
        source: CollectionId,
        target: CollectionId,
        explicit_ids: &[EntityId],
    ) -> Result<TransferPlan> {
        for collection in [source, target] {
            if !store.collection_exists(collection)? {
                return Err(Error::CollectionNotFound { collection });
            }
        }

        let candidates: BTreeSet<EntityId> = if explicit_ids.is_empty() {
            store
                .query(&AssociationFilter::in_collection(source))?
                .into_iter()
                .map(|row| row.entity_id)
                .collect()
        } else {
            store.known_entities(&explicit_ids.iter().copied().collect())?
        };

        let existing: BTreeSet<EntityId> = if candidates.is_empty() {
            BTreeSet::new()
        } else {
            store
                .query(
                    &AssociationFilter::in_collection(target)
                        .with_entities(candidates.iter().copied()),
                )?
                .into_iter()
                .map(|row| row.entity_id)
                .collect()
        };

        let rows: Vec<Association> = candidates
            .difference(&existing)
            .map(|&entity_id| Association::new(entity_id, target))
            .collect();

        debug!(
            target: "bulkops::service",
            source = %source,
            target_collection = %target,
            candidates = candidates.len(),
            existing = existing.len(),
            rows = rows.len(),
            "Resolved transfer"
        );

        Ok(TransferPlan {
            rows,
            candidates: candidates.len(),
            existing_in_target: existing.len(),
        })
    }
}
