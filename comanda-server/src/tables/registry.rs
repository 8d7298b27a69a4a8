//! Table registry implementation
//!
//! All occupancy/binding mutation flows through the `Table` aggregate, so
//! the status/order-reference invariant cannot be bypassed here.

use redb::WriteTransaction;
use shared::models::{Table, TableCreate, TableFilter, TableStatus, TableUpdate};
use uuid::Uuid;
use validator::Validate;

use super::error::{TableError, TableResult};
use crate::storage::Storage;

#[derive(Clone)]
pub struct TableRegistry {
    storage: Storage,
}

impl TableRegistry {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Find a table by id
    pub fn get(&self, table_id: &str) -> TableResult<Table> {
        self.storage
            .get_table(table_id)?
            .ok_or_else(|| TableError::NotFound(format!("Table {} not found", table_id)))
    }

    /// List tables, optionally filtered by status and/or location
    pub fn list(&self, filter: &TableFilter) -> TableResult<Vec<Table>> {
        let mut tables: Vec<Table> = self
            .storage
            .list_tables()?
            .into_iter()
            .filter(|t| filter.status.is_none_or(|s| t.status() == s))
            .filter(|t| filter.location.is_none_or(|l| t.location == l))
            .collect();
        tables.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(tables)
    }

    /// Create a new table
    pub fn create(&self, data: TableCreate) -> TableResult<Table> {
        data.validate()
            .map_err(|e| TableError::Validation(e.to_string()))?;

        if self.find_by_number(&data.number)?.is_some() {
            return Err(TableError::Duplicate(format!(
                "Table '{}' already exists",
                data.number
            )));
        }

        let table = Table::new(
            Uuid::new_v4().to_string(),
            data.number,
            data.capacity,
            data.location,
        );

        let txn = self.storage.begin_write()?;
        self.storage.store_table(&txn, &table)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(table_id = %table.id, number = %table.number, "Table created");
        Ok(table)
    }

    /// Update a table's descriptive fields (not its status or binding)
    pub fn update(&self, table_id: &str, data: TableUpdate) -> TableResult<Table> {
        data.validate()
            .map_err(|e| TableError::Validation(e.to_string()))?;

        let mut table = self.get(table_id)?;

        if let Some(number) = &data.number
            && *number != table.number
            && let Some(found) = self.find_by_number(number)?
            && found.id != table.id
        {
            return Err(TableError::Duplicate(format!(
                "Table '{}' already exists",
                number
            )));
        }

        if let Some(number) = data.number {
            table.number = number;
        }
        if let Some(capacity) = data.capacity {
            table.capacity = capacity;
        }
        if let Some(location) = data.location {
            table.location = location;
        }
        table.updated_at = shared::util::now_millis();

        let txn = self.storage.begin_write()?;
        self.storage.store_table(&txn, &table)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        Ok(table)
    }

    /// Delete a table.
    ///
    /// An occupied table cannot be deleted; its order must be closed out
    /// first.
    pub fn delete(&self, table_id: &str) -> TableResult<()> {
        let table = self.get(table_id)?;
        if table.is_occupied() {
            return Err(TableError::InvalidTransition(format!(
                "cannot delete table {} while occupied",
                table.number
            )));
        }

        let txn = self.storage.begin_write()?;
        let existed = self.storage.delete_table(&txn, table_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        if !existed {
            return Err(TableError::NotFound(format!(
                "Table {} not found",
                table_id
            )));
        }
        tracing::info!(table_id, "Table deleted");
        Ok(())
    }

    /// Manual status change (housekeeping transitions only).
    ///
    /// Setting OCCUPIED directly is rejected by the aggregate; occupancy only
    /// happens through `bind_order`.
    pub fn set_status(&self, table_id: &str, status: TableStatus) -> TableResult<Table> {
        let mut table = self.get(table_id)?;
        table.set_status(status)?;

        let txn = self.storage.begin_write()?;
        self.storage.store_table(&txn, &table)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        Ok(table)
    }

    /// Bind an order to a table (own transaction)
    pub fn bind_order(&self, table_id: &str, order_id: &str) -> TableResult<Table> {
        let txn = self.storage.begin_write()?;
        let table = self.bind_order_txn(&txn, table_id, order_id)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(table)
    }

    /// Unbind the current order (own transaction); caller picks the
    /// resulting status
    pub fn unbind_order(&self, table_id: &str, next: TableStatus) -> TableResult<Table> {
        let txn = self.storage.begin_write()?;
        let (table, _order) = self.unbind_order_txn(&txn, table_id, next)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(table)
    }

    /// Bind an order within a caller-owned transaction, keeping the binding
    /// atomic with whatever else the caller persists
    pub fn bind_order_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        order_id: &str,
    ) -> TableResult<Table> {
        let mut table = self
            .storage
            .get_table_txn(txn, table_id)?
            .ok_or_else(|| TableError::NotFound(format!("Table {} not found", table_id)))?;
        table.bind_order(order_id)?;
        self.storage.store_table(txn, &table)?;
        self.storage.set_open_order(txn, table_id, order_id)?;
        Ok(table)
    }

    /// Unbind within a caller-owned transaction; returns the table and the
    /// unbound order id
    pub fn unbind_order_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        next: TableStatus,
    ) -> TableResult<(Table, String)> {
        let mut table = self
            .storage
            .get_table_txn(txn, table_id)?
            .ok_or_else(|| TableError::NotFound(format!("Table {} not found", table_id)))?;
        let order_id = table.unbind_order(next)?;
        self.storage.store_table(txn, &table)?;
        self.storage.clear_open_order(txn, table_id)?;
        Ok((table, order_id))
    }

    fn find_by_number(&self, number: &str) -> TableResult<Option<Table>> {
        Ok(self
            .storage
            .list_tables()?
            .into_iter()
            .find(|t| t.number == number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Area;

    fn registry() -> TableRegistry {
        TableRegistry::new(Storage::open_in_memory().unwrap())
    }

    fn create_spec(number: &str) -> TableCreate {
        TableCreate {
            number: number.to_string(),
            capacity: 4,
            location: Area::Main,
        }
    }

    #[test]
    fn create_and_get() {
        let registry = registry();
        let table = registry.create(create_spec("T1")).unwrap();
        let loaded = registry.get(&table.id).unwrap();
        assert_eq!(loaded.number, "T1");
        assert_eq!(loaded.status(), TableStatus::Available);
    }

    #[test]
    fn duplicate_number_rejected() {
        let registry = registry();
        registry.create(create_spec("T1")).unwrap();
        assert!(matches!(
            registry.create(create_spec("T1")),
            Err(TableError::Duplicate(_))
        ));
    }

    #[test]
    fn invalid_capacity_rejected() {
        let registry = registry();
        let mut spec = create_spec("T1");
        spec.capacity = 0;
        assert!(matches!(
            registry.create(spec),
            Err(TableError::Validation(_))
        ));
    }

    #[test]
    fn list_filters_by_status_and_location() {
        let registry = registry();
        let t1 = registry.create(create_spec("T1")).unwrap();
        let mut outdoor = create_spec("T2");
        outdoor.location = Area::Outdoor;
        registry.create(outdoor).unwrap();

        registry.set_status(&t1.id, TableStatus::Reserved).unwrap();

        let reserved = registry
            .list(&TableFilter {
                status: Some(TableStatus::Reserved),
                location: None,
            })
            .unwrap();
        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].number, "T1");

        let outdoor = registry
            .list(&TableFilter {
                status: None,
                location: Some(Area::Outdoor),
            })
            .unwrap();
        assert_eq!(outdoor.len(), 1);
        assert_eq!(outdoor[0].number, "T2");
    }

    #[test]
    fn set_status_occupied_rejected() {
        let registry = registry();
        let table = registry.create(create_spec("T1")).unwrap();
        assert!(matches!(
            registry.set_status(&table.id, TableStatus::Occupied),
            Err(TableError::InvalidTransition(_))
        ));
    }

    #[test]
    fn bind_unbind_roundtrip() {
        let registry = registry();
        let table = registry.create(create_spec("T1")).unwrap();

        let bound = registry.bind_order(&table.id, "order-1").unwrap();
        assert!(bound.is_occupied());
        assert_eq!(bound.current_order(), Some("order-1"));

        // Second bind conflicts
        assert!(matches!(
            registry.bind_order(&table.id, "order-2"),
            Err(TableError::ConflictingBinding(_))
        ));

        let cleared = registry
            .unbind_order(&table.id, TableStatus::Cleaning)
            .unwrap();
        assert_eq!(cleared.status(), TableStatus::Cleaning);
        assert_eq!(cleared.current_order(), None);
    }

    #[test]
    fn delete_occupied_rejected() {
        let registry = registry();
        let table = registry.create(create_spec("T1")).unwrap();
        registry.bind_order(&table.id, "order-1").unwrap();
        assert!(matches!(
            registry.delete(&table.id),
            Err(TableError::InvalidTransition(_))
        ));
    }

    #[test]
    fn update_changes_fields_but_not_binding() {
        let registry = registry();
        let table = registry.create(create_spec("T1")).unwrap();
        let updated = registry
            .update(
                &table.id,
                TableUpdate {
                    number: Some("T9".to_string()),
                    capacity: Some(6),
                    location: Some(Area::Bar),
                },
            )
            .unwrap();
        assert_eq!(updated.number, "T9");
        assert_eq!(updated.capacity, 6);
        assert_eq!(updated.location, Area::Bar);
        assert_eq!(updated.status(), TableStatus::Available);
    }
}
