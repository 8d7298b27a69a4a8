//! Dining table model
//!
//! The `Table` aggregate owns its order binding: `status` and
//! `current_order` are private and flip together through
//! [`Table::bind_order`] / [`Table::unbind_order`], so a table marked
//! OCCUPIED without a bound order is unrepresentable outside this module.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Floor area a table belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Area {
    #[default]
    Main,
    Outdoor,
    Private,
    Bar,
}

/// Table occupancy status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Maintenance,
}

impl TableStatus {
    /// A table in this status may receive a new order binding
    pub fn is_seatable(&self) -> bool {
        matches!(self, TableStatus::Available | TableStatus::Reserved)
    }
}

/// Errors raised by the table aggregate
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableStateError {
    #[error("Invalid table transition: {0}")]
    InvalidTransition(String),

    #[error("Table is already bound to order {0}")]
    ConflictingBinding(String),
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Table {
    pub id: String,
    /// Display number shown on the floor plan (e.g. "T4")
    pub number: String,
    pub capacity: i32,
    pub location: Area,
    status: TableStatus,
    /// Currently bound order, if any. Mutated only via bind/unbind.
    #[serde(skip_serializing_if = "Option::is_none")]
    current_order: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Table {
    /// Create a new table in AVAILABLE status
    pub fn new(id: String, number: String, capacity: i32, location: Area) -> Self {
        let now = crate::util::now_millis();
        Self {
            id,
            number,
            capacity,
            location,
            status: TableStatus::Available,
            current_order: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn current_order(&self) -> Option<&str> {
        self.current_order.as_deref()
    }

    pub fn is_occupied(&self) -> bool {
        self.status == TableStatus::Occupied
    }

    /// Bind an order and transition to OCCUPIED as one atomic pair.
    ///
    /// Legal only from AVAILABLE or RESERVED with no order bound.
    pub fn bind_order(&mut self, order_id: impl Into<String>) -> Result<(), TableStateError> {
        if let Some(existing) = &self.current_order {
            return Err(TableStateError::ConflictingBinding(existing.clone()));
        }
        if !self.status.is_seatable() {
            return Err(TableStateError::InvalidTransition(format!(
                "cannot seat table {} from {:?}",
                self.number, self.status
            )));
        }
        self.current_order = Some(order_id.into());
        self.status = TableStatus::Occupied;
        self.updated_at = crate::util::now_millis();
        Ok(())
    }

    /// Unbind the current order and move to the caller-chosen status.
    ///
    /// The resulting status is a business-policy decision (AVAILABLE for
    /// immediate reuse, CLEANING for turnover); returns the unbound order id.
    pub fn unbind_order(&mut self, next: TableStatus) -> Result<String, TableStateError> {
        let order_id = self.current_order.take().ok_or_else(|| {
            TableStateError::InvalidTransition(format!(
                "table {} has no bound order to clear",
                self.number
            ))
        })?;
        if !matches!(next, TableStatus::Available | TableStatus::Cleaning) {
            self.current_order = Some(order_id);
            return Err(TableStateError::InvalidTransition(format!(
                "cannot clear table {} into {:?}",
                self.number, next
            )));
        }
        self.status = next;
        self.updated_at = crate::util::now_millis();
        Ok(order_id)
    }

    /// Manual housekeeping transition.
    ///
    /// OCCUPIED can neither be entered (that requires a binding) nor left
    /// (that requires an unbind) through this path.
    pub fn set_status(&mut self, status: TableStatus) -> Result<(), TableStateError> {
        if status == TableStatus::Occupied {
            return Err(TableStateError::InvalidTransition(
                "cannot set OCCUPIED without a bound order".to_string(),
            ));
        }
        if self.current_order.is_some() {
            return Err(TableStateError::InvalidTransition(format!(
                "table {} is occupied by order {}",
                self.number,
                self.current_order.as_deref().unwrap_or_default()
            )));
        }
        self.status = status;
        self.updated_at = crate::util::now_millis();
        Ok(())
    }
}

/// Create table payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TableCreate {
    #[validate(length(min = 1, max = 32))]
    pub number: String,
    #[validate(range(min = 1, max = 100))]
    pub capacity: i32,
    #[serde(default)]
    pub location: Area,
}

/// Update table payload
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct TableUpdate {
    #[validate(length(min = 1, max = 32))]
    pub number: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
    pub location: Option<Area>,
}

/// List filter
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableFilter {
    pub status: Option<TableStatus>,
    pub location: Option<Area>,
}

/// Manual status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub status: TableStatus,
}
