//! Core types for bulkops
//!
//! This module defines the membership data model:
//! - CollectionId / Collection: named sets of entities
//! - EntityId: integer id of a company record
//! - Association: one (entity, collection) membership row
//! - OperationId: opaque identity of a submitted mutation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a collection
///
/// A CollectionId is a wrapper around a UUID v4. Collections are created by
/// CRUD code outside the engine; the engine only reads their membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(Uuid);

impl CollectionId {
    /// Create a new random CollectionId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a CollectionId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a CollectionId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for CollectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an entity (a company record)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Raw integer value
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named collection of entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection id
    pub id: CollectionId,
    /// Display name
    pub name: String,
}

impl Collection {
    /// Create a collection with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CollectionId::new(),
            name: name.into(),
        }
    }
}

/// One membership row binding an entity to a collection
///
/// Has no identity beyond the (entity_id, collection_id) pair. Ordering is by
/// collection first, then entity, matching the composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Association {
    /// Owning collection
    pub collection_id: CollectionId,
    /// Member entity
    pub entity_id: EntityId,
}

impl Association {
    /// Create an association row
    pub fn new(entity_id: EntityId, collection_id: CollectionId) -> Self {
        Self {
            collection_id,
            entity_id,
        }
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entity_id, self.collection_id)
    }
}

/// Opaque identity of one submitted mutation
///
/// Rendered as a hyphenated UUID v4. Callers must treat the text as opaque:
/// the only guarantee is global uniqueness. It is the join key between the
/// accepting path, the background run and the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generate a new random operation id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Key under which this operation's status is stored
    pub fn status_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for OperationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
