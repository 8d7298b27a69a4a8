//! Order aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{LineItem, OrderStatus, OrderType};

/// Order aggregate
///
/// `total` is a derived value: it always equals the sum of the items'
/// subtotals and is only written by `cart::recompute_totals`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Order id (assigned by the server on creation; clients may hold a
    /// provisional id before persistence completes)
    pub order_id: String,
    /// Human-readable order number, e.g. "ORD-20260808-0001"
    pub order_number: String,
    pub order_type: OrderType,
    /// Bound table (required for dine-in)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub guest_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderSnapshot {
    /// Create a new empty PENDING order
    pub fn new(order_id: String, order_number: String, order_type: OrderType) -> Self {
        let now = crate::util::now_millis();
        Self {
            order_id,
            order_number,
            order_type,
            table_id: None,
            guest_count: 1,
            special_instructions: None,
            status: OrderStatus::Pending,
            items: Vec::new(),
            total: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn find_item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn find_item_by_product(&self, product_id: i64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}
