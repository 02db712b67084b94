//! Mutation intents and the inbound request shapes
//!
//! Requests arrive from the HTTP layer as JSON. An empty (or omitted) id list
//! means "every member of the collection".

use serde::{Deserialize, Serialize};

use crate::types::{CollectionId, EntityId};

/// Remove entities from a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Collection to remove members from
    pub collection_id: CollectionId,
    /// Entities to remove; empty removes every member
    #[serde(default, rename = "company_ids", alias = "entity_ids")]
    pub entity_ids: Vec<EntityId>,
}

impl DeleteRequest {
    /// Remove every member of `collection_id`
    pub fn all(collection_id: CollectionId) -> Self {
        Self {
            collection_id,
            entity_ids: Vec::new(),
        }
    }

    /// Remove exactly `entity_ids` from `collection_id`
    pub fn only(collection_id: CollectionId, entity_ids: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            collection_id,
            entity_ids: entity_ids.into_iter().collect(),
        }
    }
}

/// Copy entities from one collection into another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Collection to copy from
    pub source_collection_id: CollectionId,
    /// Collection to copy into
    pub target_collection_id: CollectionId,
    /// Entities to copy; empty copies every member of the source
    #[serde(default, rename = "company_ids", alias = "entity_ids")]
    pub entity_ids: Vec<EntityId>,
}

impl TransferRequest {
    /// Copy every member of `source` into `target`
    pub fn all(source: CollectionId, target: CollectionId) -> Self {
        Self {
            source_collection_id: source,
            target_collection_id: target,
            entity_ids: Vec::new(),
        }
    }

    /// Copy exactly `entity_ids` into `target`
    pub fn only(
        source: CollectionId,
        target: CollectionId,
        entity_ids: impl IntoIterator<Item = EntityId>,
    ) -> Self {
        Self {
            source_collection_id: source,
            target_collection_id: target,
            entity_ids: entity_ids.into_iter().collect(),
        }
    }
}

/// In-memory description of one requested change
///
/// Constructed per request, consumed once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Delete associations from a collection
    Delete(DeleteRequest),
    /// Copy associations into a target collection, skipping existing members
    Transfer(TransferRequest),
}

impl MutationIntent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            MutationIntent::Delete(_) => "bulk_delete",
            MutationIntent::Transfer(_) => "transfer",
        }
    }
}

impl From<DeleteRequest> for MutationIntent {
    fn from(req: DeleteRequest) -> Self {
        MutationIntent::Delete(req)
    }
}

impl From<TransferRequest> for MutationIntent {
    fn from(req: TransferRequest) -> Self {
        MutationIntent::Transfer(req)
    }
}
