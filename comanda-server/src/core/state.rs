//! Shared server state

use std::path::PathBuf;

use crate::core::Config;
use crate::orders::OrderService;
use crate::storage::Storage;
use crate::tables::TableRegistry;

/// Application state shared by all handlers
///
/// Cheap to clone: every component is `Arc`-backed through the shared
/// [`Storage`] handle, so the registry and order service see the same
/// embedded database.
#[derive(Clone)]
pub struct ServerState {
    pub tables: TableRegistry,
    pub orders: OrderService,
}

impl ServerState {
    /// Initialize state from configuration, opening the database under the
    /// configured work dir
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        let db_path = PathBuf::from(&config.work_dir).join("comanda.redb");
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Storage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Storage opened");
        Ok(Self::with_storage(storage))
    }

    /// Build state on top of an existing storage handle
    pub fn with_storage(storage: Storage) -> Self {
        let tables = TableRegistry::new(storage.clone());
        let orders = OrderService::new(storage, tables.clone());
        Self { tables, orders }
    }

    /// In-memory state for tests
    pub fn in_memory() -> Self {
        let storage = Storage::open_in_memory().expect("in-memory storage");
        Self::with_storage(storage)
    }
}
