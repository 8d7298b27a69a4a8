//! Table API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::ApiResponse;
use shared::models::{Table, TableCreate, TableFilter, TableStatusUpdate, TableUpdate};
use shared::order::ClearTableRequest;

use crate::core::ServerState;
use crate::utils::{AppResult, ok};

/// GET /api/tables - list tables, optionally filtered by status/location
pub async fn list(
    State(state): State<ServerState>,
    Query(filter): Query<TableFilter>,
) -> AppResult<Json<ApiResponse<Vec<Table>>>> {
    let tables = state.tables.list(&filter)?;
    Ok(ok(tables))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Table>>> {
    let table = state.tables.get(&id)?;
    Ok(ok(table))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TableCreate>,
) -> AppResult<Json<ApiResponse<Table>>> {
    let table = state.tables.create(payload)?;
    Ok(ok(table))
}

/// PUT /api/tables/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TableUpdate>,
) -> AppResult<Json<ApiResponse<Table>>> {
    let table = state.tables.update(&id, payload)?;
    Ok(ok(table))
}

/// DELETE /api/tables/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.tables.delete(&id)?;
    Ok(ok(true))
}

/// PATCH /api/tables/{id}/status - manual housekeeping transition
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<Json<ApiResponse<Table>>> {
    let table = state.tables.set_status(&id, payload.status)?;
    Ok(ok(table))
}

/// POST /api/tables/{id}/clear - clear a table whose order is terminal
pub async fn clear(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Option<Json<ClearTableRequest>>,
) -> AppResult<Json<ApiResponse<Table>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let table = state.orders.clear_table(&id, payload.next_status)?;
    Ok(ok(table))
}
