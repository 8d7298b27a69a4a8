//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`tables`] - table registry and lifecycle endpoints
//! - [`orders`] - order and cart endpoints
//!
//! Authentication is handled by an upstream collaborator; handlers here
//! receive already-authorized traffic.

pub mod health;
pub mod orders;
pub mod tables;

use axum::Router;

use crate::core::ServerState;

/// Assemble the full API router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(tables::router())
        .merge(orders::router())
}
