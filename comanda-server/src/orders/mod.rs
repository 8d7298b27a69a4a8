//! Order subsystem
//!
//! The authoritative side of the order lifecycle:
//!
//! - **service**: order store operations, cart mutation, and the table
//!   lifecycle controller (seat / clear / complete-and-clear)
//! - **error**: the order error taxonomy
//!
//! Line-item math lives in `shared::order::cart`; this module wraps it with
//! persistence, idempotency, and table-binding semantics.

mod error;
mod service;

pub use error::{OrderError, OrderResult};
pub use service::OrderService;

// Re-export for handler convenience
pub use shared::order::CompletedOrder;
