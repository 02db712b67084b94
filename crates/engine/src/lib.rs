//! Bulk mutation engine for bulkops
//!
//! This crate turns a mutation request into a tracked background operation:
//! - BulkOps: the service; resolves, accepts, schedules, answers status polls
//! - Resolvers: compute the exact association rows before execution
//! - BatchExecutor: applies rows in bounded transactions, no retry
//! - OperationTracker: single writer of one operation's status
//! - StatusClient: best-effort status store access
//! - BackgroundScheduler: bounded FIFO queue and worker threads
//! - BulkOpsConfig: `bulkops.toml`
//!
//! The engine never installs a tracing subscriber; embedding programs do.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod background;
pub mod config;
pub mod executor;
pub mod operation;
pub mod resolve;
pub mod service;
pub mod status;

pub use background::{BackgroundScheduler, BackpressureError, SchedulerStats, TaskHandle};
pub use config::{BulkOpsConfig, CONFIG_FILE_NAME};
pub use executor::{BatchExecutor, BatchFailure, ExecutionSummary};
pub use operation::{MutationKind, OperationTracker};
pub use resolve::{DeletionResolver, TransferPlan, TransferResolver};
pub use service::BulkOps;
pub use status::StatusClient;
