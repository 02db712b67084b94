//! Bulk operation service
//!
//! `BulkOps` is the composition root: it owns the status client, the batch
//! executor and the background scheduler, and borrows the relational store.
//!
//! # Request path
//!
//! ```text
//! submit_delete / submit_transfer
//!     ├── resolve rows          (synchronous; NotFound returned here)
//!     ├── new OperationId
//!     ├── write in_progress     (or completed for an empty transfer)
//!     └── schedule run          (returns immediately)
//!
//! background worker
//!     └── BatchExecutor::execute
//!             ├── progress after each committed batch
//!             └── completed | failed
//! ```

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info, warn};

use bulkops_core::{
    Association, AssociationFilter, CollectionId, DeleteRequest, Error, MutationIntent,
    OperationId, OperationStatusResponse, RelationalStore, Result, StatusStore, StoreTransaction,
    TransferRequest,
};

use crate::background::{BackgroundScheduler, SchedulerStats, TaskHandle};
use crate::config::BulkOpsConfig;
use crate::executor::BatchExecutor;
use crate::operation::{MutationKind, OperationTracker};
use crate::resolve::{DeletionResolver, TransferResolver};
use crate::status::StatusClient;

/// Accepts bulk mutations and runs them in the background
pub struct BulkOps {
    config: BulkOpsConfig,
    store: Arc<dyn RelationalStore>,
    status: StatusClient,
    executor: BatchExecutor,
    scheduler: BackgroundScheduler,
}

impl BulkOps {
    /// Build the service and start its worker threads
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails validation.
    pub fn new(
        config: BulkOpsConfig,
        store: Arc<dyn RelationalStore>,
        status_store: Arc<dyn StatusStore>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            target: "bulkops::service",
            batch_size = config.batch_size,
            workers = config.workers,
            max_pending = config.max_pending_operations,
            status_ttl_secs = config.status_ttl_secs,
            "Starting bulk operation service"
        );
        Ok(Self {
            status: StatusClient::new(status_store, config.status_ttl()),
            executor: BatchExecutor::new(config.batch_size),
            scheduler: BackgroundScheduler::new(config.workers, config.max_pending_operations),
            store,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &BulkOpsConfig {
        &self.config
    }

    /// Remove associations from a collection in the background
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if the collection does not exist,
    /// `Overloaded` if the run cannot be scheduled, or a store error if
    /// resolution fails.
    pub fn submit_delete(&self, request: DeleteRequest) -> Result<OperationStatusResponse> {
        self.submit_delete_tracked(request).map(|(response, _)| response)
    }

    /// Like [`submit_delete`](Self::submit_delete), also returning the
    /// handle of the background run.
    pub fn submit_delete_tracked(
        &self,
        request: DeleteRequest,
    ) -> Result<(OperationStatusResponse, Option<TaskHandle>)> {
        let collection_id = request.collection_id;
        if !self.store.collection_exists(collection_id)? {
            return Err(Error::CollectionNotFound {
                collection: collection_id,
            });
        }
        let rows = DeletionResolver::resolve(self.store.as_ref(), collection_id, &request.entity_ids)?;

        let tracker = self.accept(MutationKind::Delete, rows.len());
        let response = tracker.response();
        let handle = self.schedule(tracker, RunPlan::Delete { collection_id, rows })?;
        Ok((response, Some(handle)))
    }

    /// Copy associations into another collection in the background
    ///
    /// An empty transfer completes immediately without scheduling a run.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if either collection does not exist,
    /// `Overloaded` if the run cannot be scheduled, or a store error if
    /// resolution fails.
    pub fn submit_transfer(&self, request: TransferRequest) -> Result<OperationStatusResponse> {
        self.submit_transfer_tracked(request).map(|(response, _)| response)
    }

    /// Like [`submit_transfer`](Self::submit_transfer), also returning the
    /// handle of the background run if one was scheduled.
    pub fn submit_transfer_tracked(
        &self,
        request: TransferRequest,
    ) -> Result<(OperationStatusResponse, Option<TaskHandle>)> {
        let plan = TransferResolver::resolve(
            self.store.as_ref(),
            request.source_collection_id,
            request.target_collection_id,
            &request.entity_ids,
        )?;

        if plan.rows.is_empty() {
            let mut tracker =
                OperationTracker::new(OperationId::new(), MutationKind::Transfer, self.status.clone());
            tracker.complete(MutationKind::Transfer.empty_detail());
            info!(
                target: "bulkops::service",
                operation_id = %tracker.id(),
                kind = %MutationKind::Transfer,
                candidates = plan.candidates,
                existing = plan.existing_in_target,
                "Nothing to transfer"
            );
            return Ok((tracker.response(), None));
        }

        let tracker = self.accept(MutationKind::Transfer, plan.rows.len());
        let response = tracker.response();
        let handle = self.schedule(tracker, RunPlan::Transfer { rows: plan.rows })?;
        Ok((response, Some(handle)))
    }

    /// Dispatch an intent to the matching submit method
    ///
    /// # Errors
    ///
    /// See [`submit_delete`](Self::submit_delete) and
    /// [`submit_transfer`](Self::submit_transfer).
    pub fn submit(&self, intent: MutationIntent) -> Result<OperationStatusResponse> {
        match intent {
            MutationIntent::Delete(request) => self.submit_delete(request),
            MutationIntent::Transfer(request) => self.submit_transfer(request),
        }
    }

    /// Latest status of an operation
    ///
    /// # Errors
    ///
    /// Returns `OperationNotFound` if the id does not parse, was never
    /// issued, has expired, or cannot be read.
    pub fn operation_status(&self, operation_id: &str) -> Result<OperationStatusResponse> {
        let not_found = || Error::OperationNotFound {
            operation: operation_id.to_string(),
        };
        let id: OperationId = operation_id.parse().map_err(|_| not_found())?;
        self.status
            .fetch(&id)
            .map(|status| status.into_response(id))
            .ok_or_else(not_found)
    }

    /// Block until every accepted operation has finished
    pub fn drain(&self) {
        self.scheduler.drain();
    }

    /// Finish accepted operations, then stop the workers
    ///
    /// Later submissions fail with `Overloaded`. Idempotent.
    pub fn shutdown(&self) {
        if !self.scheduler.is_shut_down() {
            info!(target: "bulkops::service", "Shutting down bulk operation service");
        }
        self.scheduler.shutdown();
    }

    /// Scheduler queue metrics
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    fn accept(&self, kind: MutationKind, total: usize) -> OperationTracker {
        let mut tracker = OperationTracker::new(OperationId::new(), kind, self.status.clone());
        tracker.accept();
        info!(
            target: "bulkops::service",
            operation_id = %tracker.id(),
            kind = %kind,
            total,
            batches = self.executor.batch_count(total),
            "Operation accepted"
        );
        tracker
    }

    fn schedule(&self, tracker: OperationTracker, plan: RunPlan) -> Result<TaskHandle> {
        let id = tracker.id();
        let kind = tracker.kind();
        let run = OperationRun {
            tracker,
            plan,
            store: Arc::clone(&self.store),
            executor: self.executor,
        };

        match self.scheduler.submit(move || run.run()) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                let err = Error::Overloaded {
                    reason: e.to_string(),
                };
                warn!(
                    target: "bulkops::service",
                    operation_id = %id,
                    kind = %kind,
                    error = %err,
                    "Operation rejected by scheduler"
                );
                // The run was dropped unstarted, so this is still the only writer
                let mut tracker = OperationTracker::new(id, kind, self.status.clone());
                tracker.fail(err.to_string());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for BulkOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkOps")
            .field("config", &self.config)
            .field("scheduler", &self.scheduler.stats())
            .finish()
    }
}

/// Resolved work of one operation
enum RunPlan {
    Delete {
        collection_id: CollectionId,
        rows: Vec<Association>,
    },
    Transfer {
        rows: Vec<Association>,
    },
}

/// Everything a background run needs; owned by exactly one task
struct OperationRun {
    tracker: OperationTracker,
    plan: RunPlan,
    store: Arc<dyn RelationalStore>,
    executor: BatchExecutor,
}

impl OperationRun {
    fn run(self) {
        let OperationRun {
            mut tracker,
            plan,
            store,
            executor,
        } = self;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            execute_plan(&mut tracker, plan, store.as_ref(), executor)
        }));

        if let Err(panic) = outcome {
            let message = format!("operation panicked: {}", panic_message(panic.as_ref()));
            error!(
                target: "bulkops::service",
                operation_id = %tracker.id(),
                kind = %tracker.kind(),
                "{}", message
            );
            tracker.fail(message);
        }
    }
}

fn execute_plan(
    tracker: &mut OperationTracker,
    plan: RunPlan,
    store: &dyn RelationalStore,
    executor: BatchExecutor,
) {
    let id = tracker.id();
    let kind = tracker.kind();

    let (rows, result) = match &plan {
        RunPlan::Delete {
            collection_id,
            rows,
        } => {
            let collection_id = *collection_id;
            let result = executor.execute(
                &id,
                store,
                rows,
                |txn: &mut dyn StoreTransaction, chunk: &[Association]| {
                    txn.delete_where(
                        &AssociationFilter::in_collection(collection_id)
                            .with_entities(chunk.iter().map(|row| row.entity_id)),
                    )
                },
                |processed, total| {
                    tracker.progress(processed, total);
                },
            );
            (rows, result)
        }
        RunPlan::Transfer { rows } => {
            let result = executor.execute(
                &id,
                store,
                rows,
                |txn: &mut dyn StoreTransaction, chunk: &[Association]| txn.bulk_insert(chunk),
                |processed, total| {
                    tracker.progress(processed, total);
                },
            );
            (rows, result)
        }
    };

    match result {
        Ok(summary) if rows.is_empty() => {
            debug_assert_eq!(summary.batches, 0);
            tracker.complete(kind.empty_detail());
            info!(target: "bulkops::service", operation_id = %id, kind = %kind, "Nothing to process");
        }
        Ok(summary) => {
            tracker.complete(kind.completed_detail(summary.processed, summary.total));
            info!(
                target: "bulkops::service",
                operation_id = %id,
                kind = %kind,
                batches = summary.batches,
                committed = summary.processed,
                affected = summary.affected,
                total = summary.total,
                "Operation completed"
            );
        }
        Err(failure) => {
            error!(
                target: "bulkops::service",
                operation_id = %id,
                kind = %kind,
                batch = failure.batch_index + 1,
                committed_batches = failure.committed_batches,
                committed = failure.processed,
                total = rows.len(),
                error = %failure.source,
                "Operation failed"
            );
            tracker.fail(failure.source.to_string());
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "(non-string panic)"
    }
}
