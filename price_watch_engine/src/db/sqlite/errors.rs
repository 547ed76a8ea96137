use thiserror::Error;

use crate::{
    db_types::{WatchId, WatchStatus},
    traits::{CollaboratorError, StoreError},
};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Watch {id} is no longer {expected}, or is held by another worker")]
    StatusConflict { id: WatchId, expected: WatchStatus },
    #[error("Illegal watch transition: {0}")]
    InvalidTransition(String),
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl From<SqliteDatabaseError> for StoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::StatusConflict { id, expected } => StoreError::StatusConflict { id, expected },
            SqliteDatabaseError::InvalidTransition(s) => StoreError::InvalidTransition(s),
            SqliteDatabaseError::NotFound(s) => StoreError::NotFound(s),
            e => StoreError::Backend(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for CollaboratorError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::NotFound(s) => CollaboratorError::Rejected(s),
            e => CollaboratorError::Unavailable(e.to_string()),
        }
    }
}
