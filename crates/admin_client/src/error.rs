use shared::domain::{ChildId, ChildKind};
use thiserror::Error;

use crate::draft::TempKey;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("draft text must not be empty")]
    EmptyText,
    #[error("position {position} is out of range for a list of {len} items")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("failed to delete {kind} {id}")]
    DeleteFailed {
        kind: ChildKind,
        id: ChildId,
        source: anyhow::Error,
    },
    #[error(transparent)]
    SaveFailed(#[from] SaveFailure),
}

impl EditorError {
    /// Validation failures are recovered locally and never reached the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EditorError::EmptyText | EditorError::PositionOutOfRange { .. }
        )
    }
}

/// Outcome of a save where at least one item write failed. Items that did
/// save keep their new ids, so a retry updates them instead of creating
/// them again.
#[derive(Debug, Error)]
#[error("{} of {} {kind} items failed to save", failed.len(), failed.len() + saved)]
pub struct SaveFailure {
    pub kind: ChildKind,
    pub saved: usize,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub position: usize,
    pub temp_key: TempKey,
    pub id: Option<ChildId>,
    pub text: String,
    pub reason: String,
}
