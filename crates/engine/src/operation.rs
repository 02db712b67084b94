//! Operation lifecycle tracking
//!
//! One [`OperationTracker`] exists per accepted operation and is moved into
//! the background task that runs it, which makes it the only writer of that
//! operation's status record. Every transition is validated against
//! [`OperationState::can_transition_to`] and pushed to the status store.

use tracing::warn;

use bulkops_core::{OperationId, OperationState, OperationStatus, OperationStatusResponse};

use crate::status::StatusClient;

/// Which mutation an operation performs; selects the detail wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Remove associations from a collection
    Delete,
    /// Copy associations into another collection
    Transfer,
}

impl MutationKind {
    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Delete => "bulk_delete",
            MutationKind::Transfer => "transfer",
        }
    }

    /// Detail written when the operation is accepted
    pub fn accepted_detail(&self) -> &'static str {
        match self {
            MutationKind::Delete => "Bulk deletion has started.",
            MutationKind::Transfer => "Transfer has started.",
        }
    }

    /// Detail written after each committed batch
    pub fn progress_detail(&self, processed: usize, total: usize) -> String {
        match self {
            MutationKind::Delete => format!("Deleted {} of {} companies.", processed, total),
            MutationKind::Transfer => format!("Transferred {} of {} companies.", processed, total),
        }
    }

    /// Detail written when every batch committed
    pub fn completed_detail(&self, processed: usize, total: usize) -> String {
        match self {
            MutationKind::Delete => format!(
                "Deleted {} of {} companies from the collection.",
                processed, total
            ),
            MutationKind::Transfer => format!("Transferred {} companies.", processed),
        }
    }

    /// Detail written when there was nothing to do
    pub fn empty_detail(&self) -> &'static str {
        match self {
            MutationKind::Delete => "No rows to process",
            MutationKind::Transfer => "No new rows to transfer",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single writer of one operation's status
#[derive(Debug)]
pub struct OperationTracker {
    id: OperationId,
    kind: MutationKind,
    client: StatusClient,
    current: OperationStatus,
}

impl OperationTracker {
    /// Track a new operation
    ///
    /// Nothing is written until the first transition; the in-memory state
    /// starts as `in_progress` with the accepted detail.
    pub fn new(id: OperationId, kind: MutationKind, client: StatusClient) -> Self {
        Self {
            id,
            kind,
            client,
            current: OperationStatus::in_progress(kind.accepted_detail()),
        }
    }

    /// Operation id
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Mutation kind
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Current state as last set by this tracker
    pub fn state(&self) -> OperationState {
        self.current.state
    }

    /// Last status set by this tracker
    pub fn status(&self) -> &OperationStatus {
        &self.current
    }

    /// Outbound shape of the current status
    pub fn response(&self) -> OperationStatusResponse {
        self.current.clone().into_response(self.id)
    }

    /// Write the initial `in_progress` record
    pub fn accept(&mut self) -> bool {
        self.transition(OperationStatus::in_progress(self.kind.accepted_detail()))
    }

    /// Record `processed` of `total` rows done
    pub fn progress(&mut self, processed: usize, total: usize) -> bool {
        self.transition(OperationStatus::in_progress(
            self.kind.progress_detail(processed, total),
        ))
    }

    /// Move to `completed`
    pub fn complete(&mut self, detail: impl Into<String>) -> bool {
        self.transition(OperationStatus::completed(detail))
    }

    /// Move to `failed`
    pub fn fail(&mut self, detail: impl Into<String>) -> bool {
        self.transition(OperationStatus::failed(detail))
    }

    /// Apply and publish `next`; returns false (and writes nothing) if the
    /// current state is terminal.
    fn transition(&mut self, next: OperationStatus) -> bool {
        if !self.current.state.can_transition_to(next.state) {
            warn!(
                target: "bulkops::status",
                operation_id = %self.id,
                from = %self.current.state,
                to = %next.state,
                "Ignoring transition out of terminal state"
            );
            return false;
        }
        self.client.publish(&self.id, &next);
        self.current = next;
        true
    }
}
