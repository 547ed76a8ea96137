use std::time::Duration;

use thiserror::Error;

use crate::db_types::{WatchId, WatchStatus};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Watch {id} is no longer {expected}, or is held by another worker")]
    StatusConflict { id: WatchId, expected: WatchStatus },
    #[error("Illegal watch transition: {0}")]
    InvalidTransition(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Failures talking to an external collaborator.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Collaborator call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Collaborator rejected the request: {0}")]
    Rejected(String),
}

impl CollaboratorError {
    /// Timeouts and outages may succeed on another attempt. Rejections will not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, CollaboratorError::Rejected(_))
    }
}

impl From<StoreError> for CollaboratorError {
    fn from(e: StoreError) -> Self {
        CollaboratorError::Unavailable(e.to_string())
    }
}
