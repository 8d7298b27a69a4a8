//! Unified error handling
//!
//! Application-level errors mapped onto the API response envelope.
//!
//! # Error code table
//!
//! | Code | Meaning | HTTP |
//! |------|---------|------|
//! | E0000 | success | 200 |
//! | E0002 | validation failed | 400 |
//! | E0003 | resource not found | 404 |
//! | E0004 | resource conflict | 409 |
//! | E0005 | business rule violation | 422 |
//! | E0006 | invalid request | 400 |
//! | E9001 | internal error | 500 |
//! | E9002 | database error | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::ApiResponse;
use tracing::error;

use crate::orders::OrderError;
use crate::storage::StorageError;
use crate::tables::TableError;
use shared::order::CartError;

/// Application error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg.clone())
            }
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006", msg.clone()),
        };

        let body = Json(ApiResponse::<()>::error(code, message));
        (status, body).into_response()
    }
}

impl From<TableError> for AppError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NotFound(msg) => AppError::NotFound(msg),
            TableError::Duplicate(msg) => AppError::Conflict(msg),
            TableError::Validation(msg) => AppError::Validation(msg),
            TableError::InvalidTransition(msg) => AppError::BusinessRule(msg),
            TableError::ConflictingBinding(msg) => AppError::Conflict(msg),
            TableError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::OrderNotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            OrderError::TableNotFound(id) => AppError::NotFound(format!("Table {} not found", id)),
            OrderError::ItemNotFound(msg) => AppError::NotFound(msg),
            OrderError::Cart(CartError::ItemNotFound(id)) => {
                AppError::NotFound(format!("Item {} not found", id))
            }
            OrderError::Cart(e) => AppError::Validation(e.to_string()),
            OrderError::InvalidTransition(msg) => AppError::BusinessRule(msg),
            OrderError::ConflictingBinding(msg) => AppError::Conflict(msg),
            OrderError::TableClearPending { order_id, table_id } => AppError::BusinessRule(format!(
                "Order {} completed but table {} could not be cleared; retry the clear",
                order_id, table_id
            )),
            OrderError::Storage(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Database(e.to_string())
    }
}

/// Create a successful envelope response
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}
