//! Order API response payloads

use serde::{Deserialize, Serialize};

use crate::models::Table;
use crate::order::snapshot::OrderSnapshot;

/// Result of completing an order together with its table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub order: OrderSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
}
