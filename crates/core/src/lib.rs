//! Core types and traits for bulkops
//!
//! This crate defines the foundational types used throughout the system:
//! - CollectionId / EntityId / Association: the membership data model
//! - OperationId: opaque identity of one submitted mutation
//! - MutationIntent and the inbound request shapes
//! - OperationState / OperationStatus: the status state machine
//! - Error: error taxonomy shared by every layer
//! - Traits: RelationalStore, StoreTransaction, StatusStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod intent;
pub mod limits;
pub mod status;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use intent::{DeleteRequest, MutationIntent, TransferRequest};
pub use limits::{DEFAULT_BATCH_SIZE, DEFAULT_STATUS_TTL, MAX_STATUS_TTL};
pub use status::{OperationState, OperationStatus, OperationStatusResponse};
pub use traits::{AssociationFilter, RelationalStore, StatusStore, StoreTransaction};
pub use types::{Association, Collection, CollectionId, EntityId, OperationId};
