//! Status store client
//!
//! Thin wrapper over an injected [`StatusStore`] that encodes
//! [`OperationStatus`] records as JSON. Status visibility is best effort:
//! a failed write is logged and swallowed so it can never fail the mutation
//! it describes, and a failed or undecodable read looks like an absent record.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use bulkops_core::{OperationId, OperationStatus, StatusStore};

/// Reads and writes operation status records
#[derive(Clone)]
pub struct StatusClient {
    store: Arc<dyn StatusStore>,
    ttl: Duration,
}

impl StatusClient {
    /// Wrap `store`; every write is readable for `ttl`
    pub fn new(store: Arc<dyn StatusStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Write `status` for `id`
    ///
    /// Never fails; errors are logged.
    pub fn publish(&self, id: &OperationId, status: &OperationStatus) {
        let value = match status.to_json() {
            Ok(value) => value,
            Err(e) => {
                error!(target: "bulkops::status", operation_id = %id, error = %e, "Failed to encode status");
                return;
            }
        };

        match self.store.set(&id.status_key(), &value, self.ttl) {
            Ok(()) => {
                debug!(
                    target: "bulkops::status",
                    operation_id = %id,
                    state = %status.state,
                    detail = status.detail.as_deref().unwrap_or(""),
                    "Status written"
                );
            }
            Err(e) => {
                error!(
                    target: "bulkops::status",
                    operation_id = %id,
                    state = %status.state,
                    error = %e,
                    "Status store write failed"
                );
            }
        }
    }

    /// Latest status of `id`, if one is readable
    pub fn fetch(&self, id: &OperationId) -> Option<OperationStatus> {
        let raw = match self.store.get(&id.status_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(target: "bulkops::status", operation_id = %id, error = %e, "Status store read failed");
                return None;
            }
        };

        match OperationStatus::from_json(&raw) {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(target: "bulkops::status", operation_id = %id, error = %e, "Undecodable status record");
                None
            }
        }
    }
}

impl std::fmt::Debug for StatusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusClient").field("ttl", &self.ttl).finish()
    }
}
