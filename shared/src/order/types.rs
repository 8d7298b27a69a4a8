//! Shared order types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ProductSnapshot;

/// Order type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeout,
    Delivery,
}

/// Order status
///
/// `PENDING → IN_PROGRESS → COMPLETED`, with `CANCELLED` reachable from
/// either non-terminal state. COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the status machine permits moving to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::InProgress)
            | (OrderStatus::Pending, OrderStatus::Completed)
            | (OrderStatus::Pending, OrderStatus::Cancelled)
            | (OrderStatus::InProgress, OrderStatus::Completed)
            | (OrderStatus::InProgress, OrderStatus::Cancelled) => true,
            _ => false,
        }
    }
}

/// One product entry within an order
///
/// `name` and `unit_price` are snapshotted from the catalog at time of add;
/// `subtotal` is always `unit_price * quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Item id (provisional until the order has been persisted)
    pub id: String,
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_quantity() -> i32 {
    1
}

/// Cart item input - for adding items to an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CartItemInput {
    /// Snapshot a catalog product into a cart input
    pub fn from_product(product: &ProductSnapshot, quantity: i32, notes: Option<String>) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
            notes,
        }
    }
}

/// Item changes for the explicit editing path (None = no change)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
