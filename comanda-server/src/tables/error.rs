//! Table registry errors

use shared::models::TableStateError;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table not found: {0}")]
    NotFound(String),

    #[error("Table already exists: {0}")]
    Duplicate(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflicting binding: {0}")]
    ConflictingBinding(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<TableStateError> for TableError {
    fn from(e: TableStateError) -> Self {
        match e {
            TableStateError::InvalidTransition(msg) => TableError::InvalidTransition(msg),
            TableStateError::ConflictingBinding(order_id) => TableError::ConflictingBinding(
                format!("table is already bound to order {}", order_id),
            ),
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;
