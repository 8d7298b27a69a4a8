//! Order module
//!
//! Types and mutation logic for the order aggregate:
//! - `types`: line items, statuses, cart inputs
//! - `snapshot`: the order aggregate itself
//! - `cart`: the cart engine (all line-item mutation + total recomputation)

pub mod cart;
pub mod requests;
pub mod responses;
pub mod snapshot;
pub mod types;

// Re-exports
pub use cart::CartError;
pub use requests::{
    CartAddRequest, CartRemoveRequest, ClearTableRequest, CompleteAndClearRequest, CompleteRequest,
    NewItemRequest, OpenOrderRequest, OrderUpdate, SeatRequest,
};
pub use responses::CompletedOrder;
pub use snapshot::OrderSnapshot;
pub use types::{CartItemInput, ItemChanges, LineItem, OrderStatus, OrderType};
