//! Comanda Server - restaurant floor and order service
//!
//! # Module structure
//!
//! ```text
//! comanda-server/src/
//! ├── core/      # config, state, server assembly
//! ├── storage/   # embedded redb persistence
//! ├── tables/    # table registry (occupancy + order binding)
//! ├── orders/    # order store, cart operations, table lifecycle
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # errors, logging
//! ```
//!
//! The cart engine itself lives in the `shared` crate so clients can apply
//! the same mutations optimistically.

pub mod api;
pub mod core;
pub mod orders;
pub mod storage;
pub mod tables;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use crate::orders::OrderService;
pub use crate::storage::Storage;
pub use crate::tables::TableRegistry;
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};
