//! bulkops - asynchronous batched association mutations
//!
//! Deletes or transfers large numbers of entity/collection associations in
//! the background, one bounded transaction per batch, while clients poll a
//! separate status store for progress.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use bulkops::{BulkOps, BulkOpsConfig, DeleteRequest, MemoryStatusStore, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let list = store.create_collection("My List");
//! let ids = store.add_entities(["Acme", "Globex"]);
//! store.associate(list, ids)?;
//!
//! let ops = BulkOps::new(BulkOpsConfig::default(), store, Arc::new(MemoryStatusStore::new()))?;
//! let accepted = ops.submit_delete(DeleteRequest::all(list))?;
//!
//! // ... later ...
//! let status = ops.operation_status(&accepted.operation_id)?;
//! ```
//!
//! # Architecture
//!
//! - `bulkops-core`: data model, request shapes, status state machine, store traits
//! - `bulkops-storage`: in-memory relational and status stores
//! - `bulkops-engine`: resolvers, batch executor, scheduler and the [`BulkOps`] service

pub use bulkops_core::{
    Association, AssociationFilter, Collection, CollectionId, DeleteRequest, EntityId, Error,
    MutationIntent, OperationId, OperationState, OperationStatus, OperationStatusResponse,
    RelationalStore, Result, StatusStore, StoreTransaction, TransferRequest, DEFAULT_BATCH_SIZE,
    DEFAULT_STATUS_TTL,
};
pub use bulkops_engine::{
    BackgroundScheduler, BackpressureError, BatchExecutor, BatchFailure, BulkOps, BulkOpsConfig,
    DeletionResolver, ExecutionSummary, MutationKind, OperationTracker, SchedulerStats,
    StatusClient, TaskHandle, TransferPlan, TransferResolver, CONFIG_FILE_NAME,
};
pub use bulkops_storage::{
    ExpirySweeper, MemoryStatusStore, MemoryStore, MemoryTransaction, SeedPlan, SeededCollections,
    TtlIndex,
};
