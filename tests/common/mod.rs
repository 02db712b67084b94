//! Shared test utilities for the root integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

pub use bulkops::{
    BulkOps, BulkOpsConfig, CollectionId, DeleteRequest, EntityId, Error, MemoryStatusStore,
    MemoryStore, OperationState, OperationStatusResponse, TransferRequest,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test harness's captured output.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Fixture
// ============================================================================

/// A service wired to fresh in-memory stores.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub status: Arc<MemoryStatusStore>,
    pub ops: BulkOps,
}

impl Fixture {
    pub fn new(batch_size: usize) -> Self {
        Self::with_store(MemoryStore::new(), batch_size)
    }

    pub fn with_store(store: MemoryStore, batch_size: usize) -> Self {
        init_tracing();
        let store = Arc::new(store);
        let status = Arc::new(MemoryStatusStore::new());
        let config = BulkOpsConfig {
            batch_size,
            workers: 2,
            ..BulkOpsConfig::default()
        };
        let ops = BulkOps::new(config, store.clone(), status.clone()).unwrap();
        Self { store, status, ops }
    }

    /// Create `count` companies and return their ids.
    pub fn companies(&self, count: usize) -> Vec<EntityId> {
        self.store
            .add_entities((0..count).map(|i| format!("Company {}", i)))
    }

    /// Create a collection holding `members`.
    pub fn collection(&self, name: &str, members: &[EntityId]) -> CollectionId {
        let id = self.store.create_collection(name);
        self.store.associate(id, members.iter().copied()).unwrap();
        id
    }

    /// Poll until the operation is terminal.
    pub fn wait_terminal(&self, operation_id: &str) -> OperationStatusResponse {
        wait_terminal(&self.ops, operation_id)
    }
}

/// Poll `ops` until `operation_id` reaches a terminal state.
///
/// Panics after ten seconds.
pub fn wait_terminal(ops: &BulkOps, operation_id: &str) -> OperationStatusResponse {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = ops.operation_status(operation_id).unwrap();
        if status.status.is_terminal() {
            return status;
        }
        assert!(
            Instant::now() < deadline,
            "operation {} still {} after 10s",
            operation_id,
            status.status
        );
        thread::sleep(Duration::from_millis(2));
    }
}
