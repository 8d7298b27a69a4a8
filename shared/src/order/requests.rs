//! Order API request payloads
//!
//! Shared between the server handlers and the client so both sides agree on
//! the wire shape. Mutations that must not double-apply on retry carry an
//! optional client-generated `request_id` the server deduplicates on.

use serde::{Deserialize, Serialize};

use crate::models::TableStatus;
use crate::order::types::{CartItemInput, OrderStatus, OrderType};

fn default_guest_count() -> i32 {
    1
}

fn default_quantity() -> i32 {
    1
}

/// Seat a table: create a dine-in order bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRequest {
    #[serde(default = "default_guest_count")]
    pub guest_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Default for SeatRequest {
    fn default() -> Self {
        Self {
            guest_count: 1,
            special_instructions: None,
            request_id: None,
        }
    }
}

/// Open a takeout/delivery order with no table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrderRequest {
    pub order_type: OrderType,
    #[serde(default = "default_guest_count")]
    pub guest_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Quick-add an item to a table's cart, creating the order if absent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAddRequest {
    pub item: CartItemInput,
    /// Guest count used when the order has to be created first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Remove (or reduce) a product from a table's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartRemoveRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub remove_entire_item: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Explicitly add a new line item to an order (never coalesces)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItemRequest {
    pub item: CartItemInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Update order info and/or drive a status transition
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

/// Complete an order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Complete an order and clear its table in one logical operation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompleteAndClearRequest {
    /// Resulting table status; defaults to CLEANING
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_status: Option<TableStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Clear a table whose bound order is already terminal
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClearTableRequest {
    /// Resulting table status; defaults to CLEANING
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_status: Option<TableStatus>,
}
