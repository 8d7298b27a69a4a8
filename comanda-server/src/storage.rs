//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `tables` | `table_id` | `Table` (JSON) | table registry |
//! | `orders` | `order_id` | `OrderSnapshot` (JSON) | order store |
//! | `open_order_by_table` | `table_id` | `order_id` | "current open order for table X" index |
//! | `processed_requests` | `request_id` | `()` | mutation idempotency |
//! | `counters` | name | `u64` | order-number sequence |
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with atomic pointer swap), so a terminal losing power mid-shift never sees
//! a half-applied mutation. Both aggregates live in this one database: a
//! single write transaction flips a table's binding and its order's state
//! together, which is what makes seat/clear/complete-and-clear atomic for
//! concurrent readers.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::Table;
use shared::order::OrderSnapshot;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table registry: key = table_id, value = JSON-serialized Table
const TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tables");

/// Order store: key = order_id, value = JSON-serialized OrderSnapshot
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Open-order index: key = table_id, value = order_id
const OPEN_ORDER_TABLE: TableDefinition<&str, &str> = TableDefinition::new("open_order_by_table");

/// Processed mutation requests: key = request_id, value = empty (idempotency)
const PROCESSED_REQUESTS_TABLE: TableDefinition<&str, ()> =
    TableDefinition::new("processed_requests");

/// Counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Embedded storage backed by redb
#[derive(Clone)]
pub struct Storage {
    db: Arc<Database>,
}

impl Storage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(OPEN_ORDER_TABLE)?;
            let _ = write_txn.open_table(PROCESSED_REQUESTS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(ORDER_COUNT_KEY)?.is_none() {
                counters.insert(ORDER_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Table Operations ==========

    /// Store a table within a transaction
    pub fn store_table(&self, txn: &WriteTransaction, table: &Table) -> StorageResult<()> {
        let mut t = txn.open_table(TABLES_TABLE)?;
        let value = serde_json::to_vec(table)?;
        t.insert(table.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a table by id
    pub fn get_table(&self, table_id: &str) -> StorageResult<Option<Table>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(TABLES_TABLE)?;
        match t.get(table_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get a table by id within a write transaction
    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<Table>> {
        let t = txn.open_table(TABLES_TABLE)?;
        match t.get(table_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List all tables
    pub fn list_tables(&self) -> StorageResult<Vec<Table>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(TABLES_TABLE)?;

        let mut tables = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            tables.push(serde_json::from_slice(value.value())?);
        }
        Ok(tables)
    }

    /// Delete a table; returns whether it existed
    pub fn delete_table(&self, txn: &WriteTransaction, table_id: &str) -> StorageResult<bool> {
        let mut t = txn.open_table(TABLES_TABLE)?;
        Ok(t.remove(table_id)?.is_some())
    }

    // ========== Order Operations ==========

    /// Store an order within a transaction
    pub fn store_order(&self, txn: &WriteTransaction, order: &OrderSnapshot) -> StorageResult<()> {
        let mut t = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        t.insert(order.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<OrderSnapshot>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(ORDERS_TABLE)?;
        match t.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id within a write transaction
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<OrderSnapshot>> {
        let t = txn.open_table(ORDERS_TABLE)?;
        match t.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    // ========== Open-Order Index ==========

    /// Bind table -> open order in the index
    pub fn set_open_order(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut t = txn.open_table(OPEN_ORDER_TABLE)?;
        t.insert(table_id, order_id)?;
        Ok(())
    }

    /// Remove the open-order binding for a table
    pub fn clear_open_order(&self, txn: &WriteTransaction, table_id: &str) -> StorageResult<()> {
        let mut t = txn.open_table(OPEN_ORDER_TABLE)?;
        t.remove(table_id)?;
        Ok(())
    }

    /// Current open order for a table, if any
    pub fn open_order_for_table(&self, table_id: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(OPEN_ORDER_TABLE)?;
        Ok(t.get(table_id)?.map(|guard| guard.value().to_string()))
    }

    /// Current open order for a table within a write transaction
    pub fn open_order_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<String>> {
        let t = txn.open_table(OPEN_ORDER_TABLE)?;
        Ok(t.get(table_id)?.map(|guard| guard.value().to_string()))
    }

    // ========== Request Idempotency ==========

    /// Check whether a mutation request has already been applied
    pub fn is_request_processed(&self, request_id: &str) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(PROCESSED_REQUESTS_TABLE)?;
        Ok(t.get(request_id)?.is_some())
    }

    /// Check idempotency within a write transaction
    pub fn is_request_processed_txn(
        &self,
        txn: &WriteTransaction,
        request_id: &str,
    ) -> StorageResult<bool> {
        let t = txn.open_table(PROCESSED_REQUESTS_TABLE)?;
        Ok(t.get(request_id)?.is_some())
    }

    /// Mark a mutation request as applied
    pub fn mark_request_processed(
        &self,
        txn: &WriteTransaction,
        request_id: &str,
    ) -> StorageResult<()> {
        let mut t = txn.open_table(PROCESSED_REQUESTS_TABLE)?;
        t.insert(request_id, ())?;
        Ok(())
    }

    // ========== Order Counter ==========

    /// Increment and return the order counter.
    ///
    /// Runs in its own transaction, committed before the caller's write
    /// transaction begins (redb does not allow nested writes); a crash after
    /// this point wastes a number but never reuses one.
    pub fn next_order_count(&self) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let next = {
            let mut t = txn.open_table(COUNTERS_TABLE)?;
            let current = t.get(ORDER_COUNT_KEY)?.map(|g| g.value()).unwrap_or(0);
            let next = current + 1;
            t.insert(ORDER_COUNT_KEY, next)?;
            next
        };
        txn.commit()?;
        Ok(next)
    }
}
