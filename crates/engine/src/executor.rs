//! Batched execution against a transactional store
//!
//! A resolved row set is applied in consecutive chunks of at most
//! `batch_size` rows. Each chunk gets its own transaction:
//!
//! ```text
//! for chunk in rows.chunks(batch_size):
//!     txn = store.begin()
//!     apply(txn, chunk)          -- error: rollback, abort
//!     txn.commit()               -- error: abort
//!     on_progress(cumulative, total)
//! ```
//!
//! There is no retry. When a batch fails, the batches before it stay
//! committed and the batches after it are never attempted; the returned
//! [`BatchFailure`] says where execution stopped.

use thiserror::Error;
use tracing::{error, info};

use bulkops_core::{Error, OperationId, RelationalStore, StoreTransaction, DEFAULT_BATCH_SIZE};

/// Outcome of a run in which every batch committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Batches committed
    pub batches: usize,
    /// Rows handed to `apply` across all batches
    pub processed: usize,
    /// Rows the store reported as changed
    pub affected: usize,
    /// Size of the resolved row set
    pub total: usize,
}

/// A batch failed; earlier batches remain committed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch {batch_index} failed after {committed_batches} committed batches ({processed} rows): {source}")]
pub struct BatchFailure {
    /// Zero-based index of the failed batch
    pub batch_index: usize,
    /// Batches committed before the failure
    pub committed_batches: usize,
    /// Rows committed before the failure
    pub processed: usize,
    /// Error returned by `begin`, `apply` or `commit`
    pub source: Error,
}

/// Applies row sets in bounded transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchExecutor {
    batch_size: usize,
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchExecutor {
    /// Executor committing at most `batch_size` rows per transaction
    ///
    /// A zero size is treated as 1; configuration validation rejects it
    /// before it gets here.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Rows per transaction
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches `total` rows are split into
    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size)
    }

    /// Apply `rows` in batches
    ///
    /// `apply` stages one chunk in the given transaction and returns the
    /// number of rows the store changed. `on_progress(cumulative, total)` is
    /// called after each successful commit.
    ///
    /// An empty `rows` opens no transaction and returns a zero summary.
    ///
    /// # Errors
    ///
    /// Returns [`BatchFailure`] for the first batch whose `begin`, `apply` or
    /// `commit` fails.
    pub fn execute<R, A, P>(
        &self,
        operation_id: &OperationId,
        store: &dyn RelationalStore,
        rows: &[R],
        mut apply: A,
        mut on_progress: P,
    ) -> Result<ExecutionSummary, BatchFailure>
    where
        A: FnMut(&mut dyn StoreTransaction, &[R]) -> bulkops_core::Result<usize>,
        P: FnMut(usize, usize),
    {
        let total = rows.len();
        let batches = self.batch_count(total);
        let mut summary = ExecutionSummary {
            batches: 0,
            processed: 0,
            affected: 0,
            total,
        };

        for (batch_index, chunk) in rows.chunks(self.batch_size).enumerate() {
            let fail = |source: Error, summary: &ExecutionSummary| {
                error!(
                    target: "bulkops::executor",
                    operation_id = %operation_id,
                    batch = batch_index + 1,
                    batches,
                    committed = summary.processed,
                    total,
                    error = %source,
                    "Batch failed"
                );
                BatchFailure {
                    batch_index,
                    committed_batches: summary.batches,
                    processed: summary.processed,
                    source,
                }
            };

            let mut txn = store.begin().map_err(|e| fail(e, &summary))?;
            let affected = match apply(txn.as_mut(), chunk) {
                Ok(affected) => affected,
                Err(e) => {
                    txn.rollback();
                    return Err(fail(e, &summary));
                }
            };
            txn.commit().map_err(|e| fail(e, &summary))?;

            summary.batches += 1;
            summary.processed += chunk.len();
            summary.affected += affected;

            info!(
                target: "bulkops::executor",
                operation_id = %operation_id,
                batch = batch_index + 1,
                batches,
                size = chunk.len(),
                committed = summary.processed,
                total,
                "Batch committed"
            );
            on_progress(summary.processed, total);
        }

        Ok(summary)
    }
}
