//! Product catalog snapshot types
//!
//! The catalog itself is an external collaborator; the floor service only
//! consumes read-only product lookups and snapshots the result onto line
//! items at time of add.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Read-only product view returned by the catalog collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSnapshot {
    pub id: i64,
    pub name: String,
    /// Unit price at lookup time; later catalog changes do not
    /// retroactively alter existing line items
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
