//! Order subsystem errors

use shared::order::CartError;
use thiserror::Error;

use crate::storage::StorageError;
use crate::tables::TableError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflicting binding: {0}")]
    ConflictingBinding(String),

    /// `complete_and_clear` finished the order but could not clear the table.
    /// The order stays COMPLETED; the caller must retry the table clear.
    #[error("Order {order_id} completed but table {table_id} not cleared")]
    TableClearPending { order_id: String, table_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<TableError> for OrderError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NotFound(msg) => OrderError::TableNotFound(msg),
            TableError::InvalidTransition(msg) => OrderError::InvalidTransition(msg),
            TableError::ConflictingBinding(msg) => OrderError::ConflictingBinding(msg),
            TableError::Duplicate(msg) | TableError::Validation(msg) => {
                OrderError::InvalidTransition(msg)
            }
            TableError::Storage(e) => OrderError::Storage(e),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
