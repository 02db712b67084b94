//! Operation status state machine
//!
//! ```text
//! in_progress ──┬──> completed
//!    │  ▲       └──> failed
//!    └──┘ (progress updates)
//! ```
//!
//! Terminal states have no outgoing transitions. The detail string is
//! advisory text for humans and is never parsed for control flow.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::OperationId;

/// Lifecycle state of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    /// Accepted and running (initial state)
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with an unrecovered error
    Failed,
}

impl OperationState {
    /// Check if no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Failed)
    }

    /// Whether `self -> next` is a legal transition
    ///
    /// `in_progress -> in_progress` is legal (progress update).
    pub fn can_transition_to(&self, next: OperationState) -> bool {
        matches!(self, OperationState::InProgress)
            && matches!(
                next,
                OperationState::InProgress | OperationState::Completed | OperationState::Failed
            )
    }

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::InProgress => "in_progress",
            OperationState::Completed => "completed",
            OperationState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A status record as stored in the status store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    /// Current state
    #[serde(rename = "status")]
    pub state: OperationState,
    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl OperationStatus {
    /// Running, with a detail message
    pub fn in_progress(detail: impl Into<String>) -> Self {
        Self {
            state: OperationState::InProgress,
            detail: Some(detail.into()),
        }
    }

    /// Finished successfully
    pub fn completed(detail: impl Into<String>) -> Self {
        Self {
            state: OperationState::Completed,
            detail: Some(detail.into()),
        }
    }

    /// Finished with an error
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            state: OperationState::Failed,
            detail: Some(detail.into()),
        }
    }

    /// Encode for the status store
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a status store value
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Attach the operation id for the outbound shape
    pub fn into_response(self, operation_id: OperationId) -> OperationStatusResponse {
        OperationStatusResponse {
            operation_id: operation_id.to_string(),
            status: self.state,
            detail: self.detail,
        }
    }
}

/// Outbound status shape returned to the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatusResponse {
    /// Opaque operation id
    pub operation_id: String,
    /// Current state
    pub status: OperationState,
    /// Human-readable detail
    #[serde(default)]
    pub detail: Option<String>,
}
