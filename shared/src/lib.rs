//! Shared types for the Comanda floor service
//!
//! Common types used by both the server and the client: table and order
//! models, the cart engine, the API response envelope, and utility helpers.

pub mod models;
pub mod order;
pub mod response;
pub mod util;

// Re-exports
pub use response::ApiResponse;
pub use serde::{Deserialize, Serialize};
