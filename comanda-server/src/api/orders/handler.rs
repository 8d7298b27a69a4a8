//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ApiResponse;
use shared::order::requests::{
    CartAddRequest, CartRemoveRequest, CompleteAndClearRequest, CompleteRequest, NewItemRequest,
    OpenOrderRequest, OrderUpdate, SeatRequest,
};
use shared::order::{ItemChanges, OrderSnapshot};

use crate::core::ServerState;
use crate::orders::CompletedOrder;
use crate::utils::{AppResult, ok};

/// POST /api/orders - open a takeout/delivery order (no table)
pub async fn open_order(
    State(state): State<ServerState>,
    Json(payload): Json<OpenOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.open_order(&payload)?;
    Ok(ok(order))
}

/// POST /api/orders/table/{table_id} - seat the table and create its order
pub async fn seat(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
    Json(payload): Json<SeatRequest>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.seat(&table_id, &payload)?;
    Ok(ok(order))
}

/// POST /api/orders/table/{table_id}/cart - quick-add an item, creating the
/// order if the table has none
pub async fn cart_add(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
    Json(payload): Json<CartAddRequest>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.quick_add(&table_id, &payload)?;
    Ok(ok(order))
}

/// DELETE /api/orders/table/{table_id}/cart - reduce or remove a product
pub async fn cart_remove(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
    Json(payload): Json<CartRemoveRequest>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.remove_from_cart(&table_id, &payload)?;
    Ok(ok(order))
}

/// GET /api/orders/table/{table_id}/current
pub async fn current_for_table(
    State(state): State<ServerState>,
    Path(table_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.current_for_table(&table_id)?;
    Ok(ok(order))
}

/// GET /api/orders/{order_id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.get(&order_id)?;
    Ok(ok(order))
}

/// PUT /api/orders/{order_id} - update info / drive a status transition
pub async fn update(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.update(&order_id, &payload)?;
    Ok(ok(order))
}

/// POST /api/orders/{order_id}/items - explicit add-new-entry (no coalesce)
pub async fn append_item(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    Json(payload): Json<NewItemRequest>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.append_item(&order_id, &payload)?;
    Ok(ok(order))
}

/// PATCH /api/orders/{order_id}/items/{item_id} - edit quantity/notes
pub async fn edit_item(
    State(state): State<ServerState>,
    Path((order_id, item_id)): Path<(String, String)>,
    Json(payload): Json<ItemChanges>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.edit_item(&order_id, &item_id, &payload)?;
    Ok(ok(order))
}

/// DELETE /api/orders/{order_id}/items/{item_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    Path((order_id, item_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let order = state.orders.remove_item(&order_id, &item_id)?;
    Ok(ok(order))
}

/// PATCH /api/orders/{order_id}/complete
pub async fn complete(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    payload: Option<Json<CompleteRequest>>,
) -> AppResult<Json<ApiResponse<OrderSnapshot>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let order = state
        .orders
        .complete(&order_id, payload.request_id.as_deref())?;
    Ok(ok(order))
}

/// POST /api/orders/{order_id}/complete-and-clear
pub async fn complete_and_clear(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
    payload: Option<Json<CompleteAndClearRequest>>,
) -> AppResult<Json<ApiResponse<CompletedOrder>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let result = state.orders.complete_and_clear(&order_id, &payload)?;
    Ok(ok(result))
}
