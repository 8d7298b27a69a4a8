//! Comanda Client - reconciliation layer for the floor service
//!
//! Bridges an optimistic client-held order view and the authoritative
//! server: every cart mutation applies to the local view immediately, then
//! persists through a per-order FIFO queue. Server responses (normalized at
//! the transport boundary) replace the local view; failures keep the local
//! view usable and surface a retryable error.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

pub use api::{CatalogApi, OrderApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use session::TableSession;

// Re-export shared types for convenience
pub use shared::order::{CartItemInput, ItemChanges, OrderSnapshot};
