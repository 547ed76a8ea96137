use thiserror::Error;

use crate::traits::{CollaboratorError, StoreError};

#[derive(Debug, Clone, Error)]
pub enum WatchApiError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Not permitted: {0}")]
    AuthorizationError(String),
    #[error("Illegal state: {0}")]
    StateError(String),
    #[error("Conflicting update: {0}")]
    ConflictError(String),
    #[error("A dependency is unavailable: {0}")]
    UnavailableError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Reconciliation required: {0}")]
    ReconciliationAnomaly(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for WatchApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::StatusConflict { .. } => WatchApiError::ConflictError(e.to_string()),
            StoreError::InvalidTransition(s) => WatchApiError::StateError(s),
            StoreError::NotFound(s) => WatchApiError::NotFound(s),
            StoreError::Backend(s) => WatchApiError::DatabaseError(s),
        }
    }
}

impl From<CollaboratorError> for WatchApiError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::Rejected(s) => WatchApiError::ValidationError(s),
            e => WatchApiError::UnavailableError(e.to_string()),
        }
    }
}
