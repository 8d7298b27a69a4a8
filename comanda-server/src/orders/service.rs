//! Order service - order store operations and the table lifecycle controller
//!
//! # Mutation flow
//!
//! ```text
//! handler
//!     ├─ 1. Idempotency check (request_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Load + validate order / table state
//!     ├─ 4. Apply cart engine mutation
//!     ├─ 5. Persist order (and table, when the binding changes)
//!     ├─ 6. Mark request processed
//!     └─ 7. Commit
//! ```
//!
//! Table binding and order state always change inside one write transaction,
//! so no reader observes a table marked OCCUPIED without an order or an
//! order COMPLETED while its table still reports it as current.

use chrono::Utc;
use redb::WriteTransaction;
use shared::models::{Table, TableStatus};
use shared::order::requests::{
    CartAddRequest, CartRemoveRequest, CompleteAndClearRequest, NewItemRequest, OpenOrderRequest,
    OrderUpdate, SeatRequest,
};
use shared::order::{CompletedOrder, ItemChanges, OrderSnapshot, OrderStatus, OrderType, cart};
use shared::util::now_millis;
use uuid::Uuid;

use super::error::{OrderError, OrderResult};
use crate::storage::{Storage, StorageError};
use crate::tables::TableRegistry;

#[derive(Clone)]
pub struct OrderService {
    storage: Storage,
    tables: TableRegistry,
}

impl OrderService {
    pub fn new(storage: Storage, tables: TableRegistry) -> Self {
        Self { storage, tables }
    }

    // ========== Queries ==========

    /// Get an order by id
    pub fn get(&self, order_id: &str) -> OrderResult<OrderSnapshot> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Current open order for a table
    pub fn current_for_table(&self, table_id: &str) -> OrderResult<OrderSnapshot> {
        let order_id = self.storage.open_order_for_table(table_id)?.ok_or_else(|| {
            OrderError::OrderNotFound(format!("no open order for table {}", table_id))
        })?;
        self.get(&order_id)
    }

    // ========== Table Lifecycle ==========

    /// Seat a table: AVAILABLE|RESERVED -> OCCUPIED with a fresh PENDING
    /// dine-in order bound to it, as one atomic step.
    pub fn seat(&self, table_id: &str, req: &SeatRequest) -> OrderResult<OrderSnapshot> {
        if self.already_processed(req.request_id.as_deref())? {
            return self.current_for_table(table_id);
        }

        // Pre-check occupancy before burning an order number
        if let Some(existing) = self.storage.open_order_for_table(table_id)? {
            return Err(OrderError::ConflictingBinding(format!(
                "table {} already has open order {}",
                table_id, existing
            )));
        }

        // Pre-generate the order number: the counter commits its own
        // transaction and redb does not allow nested writes
        let order_number = self.next_order_number()?;
        let order_id = Uuid::new_v4().to_string();

        let txn = self.storage.begin_write()?;
        if self.already_processed_txn(&txn, req.request_id.as_deref())? {
            drop(txn);
            return self.current_for_table(table_id);
        }

        let mut order = OrderSnapshot::new(order_id.clone(), order_number, OrderType::DineIn);
        order.table_id = Some(table_id.to_string());
        order.guest_count = req.guest_count.max(1);
        order.special_instructions = req
            .special_instructions
            .clone()
            .filter(|s| !s.is_empty());

        self.tables.bind_order_txn(&txn, table_id, &order_id)?;
        self.storage.store_order(&txn, &order)?;
        self.mark_processed(&txn, req.request_id.as_deref())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.order_id, order_number = %order.order_number, table_id, "Table seated");
        Ok(order)
    }

    /// Open a takeout/delivery order with no table
    pub fn open_order(&self, req: &OpenOrderRequest) -> OrderResult<OrderSnapshot> {
        if req.order_type == OrderType::DineIn {
            return Err(OrderError::InvalidTransition(
                "dine-in orders are opened by seating a table".to_string(),
            ));
        }

        let order_number = self.next_order_number()?;
        let mut order = OrderSnapshot::new(
            Uuid::new_v4().to_string(),
            order_number,
            req.order_type,
        );
        order.guest_count = req.guest_count.max(1);
        order.special_instructions = req
            .special_instructions
            .clone()
            .filter(|s| !s.is_empty());

        let txn = self.storage.begin_write()?;
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.order_id, order_type = ?order.order_type, "Order opened");
        Ok(order)
    }

    /// Clear a table whose bound order is already terminal.
    ///
    /// This is also the retry path when `complete_and_clear` managed to
    /// complete the order but failed to clear the table.
    pub fn clear_table(
        &self,
        table_id: &str,
        next_status: Option<TableStatus>,
    ) -> OrderResult<Table> {
        let table = self.tables.get(table_id)?;
        let Some(order_id) = table.current_order().map(str::to_string) else {
            return Err(OrderError::InvalidTransition(format!(
                "table {} has nothing to clear",
                table.number
            )));
        };

        // A missing order record means the binding is stale; allow the clear
        if let Some(order) = self.storage.get_order(&order_id)?
            && !order.is_terminal()
        {
            return Err(OrderError::InvalidTransition(format!(
                "order {} on table {} is still open",
                order_id, table.number
            )));
        }

        let txn = self.storage.begin_write()?;
        let (table, _) =
            self.tables
                .unbind_order_txn(&txn, table_id, next_status.unwrap_or(TableStatus::Cleaning))?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, order_id = %order_id, "Table cleared");
        Ok(table)
    }

    /// Mark an order COMPLETED; a bound table is cleared in the same
    /// transaction
    pub fn complete(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> OrderResult<OrderSnapshot> {
        let (order, _) = self.complete_internal(order_id, TableStatus::Cleaning, request_id, false)?;
        Ok(order)
    }

    /// Mark an order COMPLETED and clear its table in one logical operation.
    ///
    /// Errors with `InvalidTransition` when the order has no table. If the
    /// table half fails, the order is still committed as COMPLETED and
    /// `TableClearPending` tells the caller to retry the clear.
    pub fn complete_and_clear(
        &self,
        order_id: &str,
        req: &CompleteAndClearRequest,
    ) -> OrderResult<CompletedOrder> {
        let next = req.next_status.unwrap_or(TableStatus::Cleaning);
        let (order, table) =
            self.complete_internal(order_id, next, req.request_id.as_deref(), true)?;
        Ok(CompletedOrder { order, table })
    }

    fn complete_internal(
        &self,
        order_id: &str,
        next_status: TableStatus,
        request_id: Option<&str>,
        require_table: bool,
    ) -> OrderResult<(OrderSnapshot, Option<Table>)> {
        if self.already_processed(request_id)? {
            let order = self.get(order_id)?;
            let table = match &order.table_id {
                Some(tid) => self.tables.get(tid).ok(),
                None => None,
            };
            return Ok((order, table));
        }

        let txn = self.storage.begin_write()?;
        if self.already_processed_txn(&txn, request_id)? {
            drop(txn);
            let order = self.get(order_id)?;
            return Ok((order, None));
        }

        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        if require_table && order.table_id.is_none() {
            return Err(OrderError::InvalidTransition(format!(
                "order {} is not associated with a table",
                order_id
            )));
        }
        if !order.status.can_transition_to(OrderStatus::Completed) {
            return Err(OrderError::InvalidTransition(format!(
                "cannot complete order {} from {:?}",
                order_id, order.status
            )));
        }

        order.status = OrderStatus::Completed;
        order.updated_at = now_millis();
        self.storage.store_order(&txn, &order)?;

        let mut cleared_table = None;
        if let Some(table_id) = order.table_id.clone() {
            // Only clear the table if it still points at this order
            let bound = self.storage.open_order_for_table_txn(&txn, &table_id)?;
            if bound.as_deref() == Some(order_id) {
                match self.tables.unbind_order_txn(&txn, &table_id, next_status) {
                    Ok((table, _)) => cleared_table = Some(table),
                    Err(e) => {
                        // Abort the joint transaction, then commit the order
                        // completion alone: a completed order must never be
                        // silently skipped because the table failed.
                        drop(txn);
                        tracing::error!(
                            order_id,
                            table_id = %table_id,
                            error = %e,
                            "Table clear failed during completion; committing order alone"
                        );
                        let txn = self.storage.begin_write()?;
                        self.storage.store_order(&txn, &order)?;
                        self.mark_processed(&txn, request_id)?;
                        txn.commit().map_err(StorageError::from)?;
                        return Err(OrderError::TableClearPending {
                            order_id: order_id.to_string(),
                            table_id,
                        });
                    }
                }
            }
        }

        self.mark_processed(&txn, request_id)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id, total = %order.total, "Order completed");
        Ok((order, cleared_table))
    }

    // ========== Cart Operations ==========

    /// Quick-add an item to a table's cart, creating and binding the order
    /// first when the table has none
    pub fn quick_add(&self, table_id: &str, req: &CartAddRequest) -> OrderResult<OrderSnapshot> {
        if self.already_processed(req.request_id.as_deref())? {
            return self.current_for_table(table_id);
        }

        if let Some(order_id) = self.storage.open_order_for_table(table_id)? {
            let txn = self.storage.begin_write()?;
            if self.already_processed_txn(&txn, req.request_id.as_deref())? {
                drop(txn);
                return self.current_for_table(table_id);
            }
            let mut order = self.load_open_order_txn(&txn, &order_id)?;
            cart::add_item(&mut order, &req.item)?;
            order.updated_at = now_millis();
            self.storage.store_order(&txn, &order)?;
            self.mark_processed(&txn, req.request_id.as_deref())?;
            txn.commit().map_err(StorageError::from)?;
            return Ok(order);
        }

        // No open order yet: seat implicitly as part of the add
        let order_number = self.next_order_number()?;
        let order_id = Uuid::new_v4().to_string();

        let txn = self.storage.begin_write()?;
        if self.already_processed_txn(&txn, req.request_id.as_deref())? {
            drop(txn);
            return self.current_for_table(table_id);
        }

        let mut order = OrderSnapshot::new(order_id.clone(), order_number, OrderType::DineIn);
        order.table_id = Some(table_id.to_string());
        order.guest_count = req.guest_count.unwrap_or(1).max(1);
        order.special_instructions = req
            .special_instructions
            .clone()
            .filter(|s| !s.is_empty());
        cart::add_item(&mut order, &req.item)?;

        self.tables.bind_order_txn(&txn, table_id, &order_id)?;
        self.storage.store_order(&txn, &order)?;
        self.mark_processed(&txn, req.request_id.as_deref())?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.order_id, table_id, "Order opened via cart add");
        Ok(order)
    }

    /// Remove (or reduce) a product from a table's cart.
    ///
    /// When the last item goes, the order is cancelled and the table freed,
    /// all in the same transaction.
    pub fn remove_from_cart(
        &self,
        table_id: &str,
        req: &CartRemoveRequest,
    ) -> OrderResult<OrderSnapshot> {
        if req.quantity < 1 {
            return Err(shared::order::CartError::InvalidQuantity(req.quantity).into());
        }
        if self.already_processed(req.request_id.as_deref())? {
            return self.current_for_table(table_id);
        }

        let order_id = self.storage.open_order_for_table(table_id)?.ok_or_else(|| {
            OrderError::OrderNotFound(format!("no open order for table {}", table_id))
        })?;

        let txn = self.storage.begin_write()?;
        if self.already_processed_txn(&txn, req.request_id.as_deref())? {
            drop(txn);
            return self.current_for_table(table_id);
        }

        let mut order = self.load_open_order_txn(&txn, &order_id)?;
        let item = order
            .items
            .iter()
            .find(|i| i.product_id == req.product_id)
            .ok_or_else(|| {
                OrderError::ItemNotFound(format!(
                    "product {} not found in order {}",
                    req.product_id, order_id
                ))
            })?;
        let item_id = item.id.clone();
        let current_qty = item.quantity;

        if req.remove_entire_item || current_qty <= req.quantity {
            cart::remove_item(&mut order, &item_id)?;
        } else {
            cart::edit_item(
                &mut order,
                &item_id,
                &ItemChanges {
                    quantity: Some(current_qty - req.quantity),
                    notes: None,
                },
            )?;
        }
        order.updated_at = now_millis();

        if order.items.is_empty() {
            // Nothing left to serve: cancel and turn the table over
            order.status = OrderStatus::Cancelled;
            self.tables
                .unbind_order_txn(&txn, table_id, TableStatus::Cleaning)?;
            tracing::info!(order_id = %order.order_id, table_id, "Order cancelled: cart emptied");
        }

        self.storage.store_order(&txn, &order)?;
        self.mark_processed(&txn, req.request_id.as_deref())?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    /// Explicitly add a new line item to an order; never coalesces with an
    /// existing entry for the same product
    pub fn append_item(&self, order_id: &str, req: &NewItemRequest) -> OrderResult<OrderSnapshot> {
        if self.already_processed(req.request_id.as_deref())? {
            return self.get(order_id);
        }

        let txn = self.storage.begin_write()?;
        if self.already_processed_txn(&txn, req.request_id.as_deref())? {
            drop(txn);
            return self.get(order_id);
        }

        let mut order = self.load_open_order_txn(&txn, order_id)?;
        cart::append_item(&mut order, &req.item)?;
        order.updated_at = now_millis();
        self.storage.store_order(&txn, &order)?;
        self.mark_processed(&txn, req.request_id.as_deref())?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    /// Edit one line item's quantity/notes
    pub fn edit_item(
        &self,
        order_id: &str,
        item_id: &str,
        changes: &ItemChanges,
    ) -> OrderResult<OrderSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_open_order_txn(&txn, order_id)?;
        cart::edit_item(&mut order, item_id, changes)?;
        order.updated_at = now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    /// Remove one line item outright
    pub fn remove_item(&self, order_id: &str, item_id: &str) -> OrderResult<OrderSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut order = self.load_open_order_txn(&txn, order_id)?;
        cart::remove_item(&mut order, item_id)?;
        order.updated_at = now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    /// Update order info and/or drive a status transition.
    ///
    /// A transition into a terminal status detaches the order from its table
    /// in the same transaction.
    pub fn update(&self, order_id: &str, update: &OrderUpdate) -> OrderResult<OrderSnapshot> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        if order.is_terminal() {
            return Err(OrderError::InvalidTransition(format!(
                "order {} is already {:?}",
                order_id, order.status
            )));
        }

        if let Some(order_type) = update.order_type
            && order_type != order.order_type
        {
            if order.table_id.is_some() && order_type != OrderType::DineIn {
                return Err(OrderError::InvalidTransition(format!(
                    "order {} is bound to a table and must stay dine-in",
                    order_id
                )));
            }
            order.order_type = order_type;
        }
        if let Some(guest_count) = update.guest_count {
            order.guest_count = guest_count.max(1);
        }
        if let Some(instructions) = &update.special_instructions {
            order.special_instructions = Some(instructions.clone()).filter(|s| !s.is_empty());
        }

        if let Some(status) = update.status
            && status != order.status
        {
            if !order.status.can_transition_to(status) {
                return Err(OrderError::InvalidTransition(format!(
                    "cannot move order {} from {:?} to {:?}",
                    order_id, order.status, status
                )));
            }
            order.status = status;

            if status.is_terminal()
                && let Some(table_id) = order.table_id.clone()
            {
                let bound = self.storage.open_order_for_table_txn(&txn, &table_id)?;
                if bound.as_deref() == Some(order_id) {
                    self.tables
                        .unbind_order_txn(&txn, &table_id, TableStatus::Cleaning)?;
                }
            }
        }

        order.updated_at = now_millis();
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    // ========== Internals ==========

    /// Load an order inside a write transaction, rejecting terminal orders
    fn load_open_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> OrderResult<OrderSnapshot> {
        let order = self
            .storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        if order.is_terminal() {
            return Err(OrderError::InvalidTransition(format!(
                "order {} is already {:?}",
                order_id, order.status
            )));
        }
        Ok(order)
    }

    fn already_processed(&self, request_id: Option<&str>) -> OrderResult<bool> {
        match request_id {
            Some(rid) => {
                let seen = self.storage.is_request_processed(rid)?;
                if seen {
                    tracing::warn!(request_id = rid, "Duplicate mutation request, replaying state");
                }
                Ok(seen)
            }
            None => Ok(false),
        }
    }

    fn already_processed_txn(
        &self,
        txn: &WriteTransaction,
        request_id: Option<&str>,
    ) -> OrderResult<bool> {
        match request_id {
            Some(rid) => Ok(self.storage.is_request_processed_txn(txn, rid)?),
            None => Ok(false),
        }
    }

    fn mark_processed(&self, txn: &WriteTransaction, request_id: Option<&str>) -> OrderResult<()> {
        if let Some(rid) = request_id {
            self.storage.mark_request_processed(txn, rid)?;
        }
        Ok(())
    }

    /// Next human-readable order number (crash-safe via the redb counter)
    fn next_order_number(&self) -> OrderResult<String> {
        let count = self.storage.next_order_count()?;
        let date = Utc::now().format("%Y%m%d");
        Ok(format!("ORD-{}-{:04}", date, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{Area, TableCreate};
    use shared::order::CartItemInput;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn setup() -> (TableRegistry, OrderService, Table) {
        let storage = Storage::open_in_memory().unwrap();
        let tables = TableRegistry::new(storage.clone());
        let orders = OrderService::new(storage, tables.clone());
        let table = tables
            .create(TableCreate {
                number: "T4".to_string(),
                capacity: 4,
                location: Area::Main,
            })
            .unwrap();
        (tables, orders, table)
    }

    fn item(product_id: i64, name: &str, price: &str, quantity: i32) -> CartItemInput {
        CartItemInput {
            product_id,
            name: name.to_string(),
            unit_price: dec(price),
            quantity,
            notes: None,
        }
    }

    fn add_request(input: CartItemInput) -> CartAddRequest {
        CartAddRequest {
            item: input,
            guest_count: None,
            special_instructions: None,
            request_id: None,
        }
    }

    #[test]
    fn seat_creates_pending_order_and_occupies_table() {
        let (tables, orders, table) = setup();

        let order = orders
            .seat(
                &table.id,
                &SeatRequest {
                    guest_count: 3,
                    special_instructions: Some("birthday".to_string()),
                    request_id: None,
                },
            )
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.order_type, OrderType::DineIn);
        assert_eq!(order.guest_count, 3);
        assert!(order.order_number.starts_with("ORD-"));

        let table = tables.get(&table.id).unwrap();
        assert!(table.is_occupied());
        assert_eq!(table.current_order(), Some(order.order_id.as_str()));

        let current = orders.current_for_table(&table.id).unwrap();
        assert_eq!(current.order_id, order.order_id);
    }

    #[test]
    fn seat_occupied_table_conflicts() {
        let (_, orders, table) = setup();
        orders.seat(&table.id, &SeatRequest::default()).unwrap();
        assert!(matches!(
            orders.seat(&table.id, &SeatRequest::default()),
            Err(OrderError::ConflictingBinding(_))
        ));
    }

    #[test]
    fn seat_replay_with_same_request_id_returns_existing_order() {
        let (_, orders, table) = setup();
        let req = SeatRequest {
            guest_count: 2,
            special_instructions: None,
            request_id: Some("req-seat-1".to_string()),
        };
        let first = orders.seat(&table.id, &req).unwrap();
        let replay = orders.seat(&table.id, &req).unwrap();
        assert_eq!(first.order_id, replay.order_id);
    }

    #[test]
    fn quick_add_creates_order_when_absent() {
        let (tables, orders, table) = setup();

        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, dec("9.99"));
        assert!(tables.get(&table.id).unwrap().is_occupied());
    }

    #[test]
    fn quick_add_coalesces_same_product() {
        let (_, orders, table) = setup();

        orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].subtotal, dec("19.98"));
        assert_eq!(order.total, dec("19.98"));
    }

    #[test]
    fn quick_add_replay_does_not_double_apply() {
        let (_, orders, table) = setup();
        let mut req = add_request(item(1, "Paella", "9.99", 1));
        req.request_id = Some("req-add-1".to_string());

        orders.quick_add(&table.id, &req).unwrap();
        let replay = orders.quick_add(&table.id, &req).unwrap();

        assert_eq!(replay.items.len(), 1);
        assert_eq!(replay.items[0].quantity, 1);
        assert_eq!(replay.total, dec("9.99"));
    }

    #[test]
    fn append_item_keeps_separate_entries() {
        let (_, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();

        let order = orders
            .append_item(
                &order.order_id,
                &NewItemRequest {
                    item: item(1, "Paella", "9.99", 1),
                    request_id: None,
                },
            )
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, dec("19.98"));
    }

    #[test]
    fn remove_from_cart_reduces_then_cancels_when_empty() {
        let (tables, orders, table) = setup();
        orders
            .quick_add(&table.id, &add_request(item(1, "Espresso", "1.20", 2)))
            .unwrap();

        // Reduce by one: item survives
        let order = orders
            .remove_from_cart(
                &table.id,
                &CartRemoveRequest {
                    product_id: 1,
                    quantity: 1,
                    remove_entire_item: false,
                    request_id: None,
                },
            )
            .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.status, OrderStatus::Pending);

        // Remove the last unit: order cancelled, table freed for turnover
        let order = orders
            .remove_from_cart(
                &table.id,
                &CartRemoveRequest {
                    product_id: 1,
                    quantity: 1,
                    remove_entire_item: false,
                    request_id: None,
                },
            )
            .unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.status, OrderStatus::Cancelled);

        let table = tables.get(&table.id).unwrap();
        assert_eq!(table.status(), TableStatus::Cleaning);
        assert_eq!(table.current_order(), None);
    }

    #[test]
    fn remove_unknown_product_fails() {
        let (_, orders, table) = setup();
        orders
            .quick_add(&table.id, &add_request(item(1, "Espresso", "1.20", 1)))
            .unwrap();
        assert!(matches!(
            orders.remove_from_cart(
                &table.id,
                &CartRemoveRequest {
                    product_id: 99,
                    quantity: 1,
                    remove_entire_item: false,
                    request_id: None,
                },
            ),
            Err(OrderError::ItemNotFound(_))
        ));
    }

    #[test]
    fn complete_clears_table_atomically() {
        let (tables, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 2)))
            .unwrap();

        let completed = orders.complete(&order.order_id, None).unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);

        let table = tables.get(&table.id).unwrap();
        assert_eq!(table.status(), TableStatus::Cleaning);
        assert_eq!(table.current_order(), None);
        assert!(matches!(
            orders.current_for_table(&table.id),
            Err(OrderError::OrderNotFound(_))
        ));
    }

    #[test]
    fn complete_and_clear_returns_both_halves() {
        let (_, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();

        let result = orders
            .complete_and_clear(&order.order_id, &CompleteAndClearRequest::default())
            .unwrap();

        assert_eq!(result.order.status, OrderStatus::Completed);
        let table = result.table.expect("table in response");
        assert_eq!(table.status(), TableStatus::Cleaning);
        assert_eq!(table.current_order(), None);
    }

    #[test]
    fn complete_and_clear_requires_table() {
        let (_, orders, _) = setup();
        let takeout = orders
            .open_order(&OpenOrderRequest {
                order_type: OrderType::Takeout,
                guest_count: 1,
                special_instructions: None,
            })
            .unwrap();
        assert!(matches!(
            orders.complete_and_clear(&takeout.order_id, &CompleteAndClearRequest::default()),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn takeout_order_completes_without_table() {
        let (_, orders, _) = setup();
        let takeout = orders
            .open_order(&OpenOrderRequest {
                order_type: OrderType::Takeout,
                guest_count: 1,
                special_instructions: None,
            })
            .unwrap();
        let order = orders
            .append_item(
                &takeout.order_id,
                &NewItemRequest {
                    item: item(1, "Bocadillo", "4.50", 2),
                    request_id: None,
                },
            )
            .unwrap();
        assert_eq!(order.total, dec("9.00"));

        let completed = orders.complete(&order.order_id, None).unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
    }

    #[test]
    fn open_dine_in_order_without_table_rejected() {
        let (_, orders, _) = setup();
        assert!(matches!(
            orders.open_order(&OpenOrderRequest {
                order_type: OrderType::DineIn,
                guest_count: 2,
                special_instructions: None,
            }),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn complete_terminal_order_rejected() {
        let (_, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();
        orders.complete(&order.order_id, None).unwrap();
        assert!(matches!(
            orders.complete(&order.order_id, None),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn clear_available_table_is_invalid() {
        let (_, orders, table) = setup();
        assert!(matches!(
            orders.clear_table(&table.id, None),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn clear_with_open_order_is_invalid() {
        let (_, orders, table) = setup();
        orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();
        assert!(matches!(
            orders.clear_table(&table.id, None),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn cancel_via_update_detaches_table() {
        let (tables, orders, table) = setup();
        let order = orders.seat(&table.id, &SeatRequest::default()).unwrap();

        let mut update = OrderUpdate::default();
        update.status = Some(OrderStatus::Cancelled);
        let cancelled = orders.update(&order.order_id, &update).unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        let table = tables.get(&table.id).unwrap();
        assert_eq!(table.current_order(), None);
        assert_eq!(table.status(), TableStatus::Cleaning);
    }

    #[test]
    fn update_rejects_illegal_transition() {
        let (_, orders, table) = setup();
        let order = orders.seat(&table.id, &SeatRequest::default()).unwrap();
        orders.complete(&order.order_id, None).unwrap();

        let mut update = OrderUpdate::default();
        update.status = Some(OrderStatus::InProgress);
        assert!(matches!(
            orders.update(&order.order_id, &update),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn update_order_type_rejected_while_table_bound() {
        let (_, orders, table) = setup();
        let order = orders.seat(&table.id, &SeatRequest::default()).unwrap();

        let mut update = OrderUpdate::default();
        update.order_type = Some(OrderType::Takeout);
        assert!(matches!(
            orders.update(&order.order_id, &update),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn edit_and_remove_item_recompute_totals() {
        let (_, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Product A", "5.00", 1)))
            .unwrap();
        let order = orders
            .quick_add(&table.id, &add_request(item(2, "Product B", "3.50", 1)))
            .unwrap();
        let item_a = order.find_item_by_product(1).unwrap().id.clone();

        let order = orders
            .edit_item(
                &order.order_id,
                &item_a,
                &ItemChanges {
                    quantity: Some(2),
                    notes: Some("well done".to_string()),
                },
            )
            .unwrap();
        assert_eq!(order.total, dec("13.50"));

        let order = orders.remove_item(&order.order_id, &item_a).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, dec("3.50"));
    }

    #[test]
    fn mutating_completed_order_rejected() {
        let (_, orders, table) = setup();
        let order = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();
        orders.complete(&order.order_id, None).unwrap();

        assert!(matches!(
            orders.append_item(
                &order.order_id,
                &NewItemRequest {
                    item: item(2, "Flan", "3.00", 1),
                    request_id: None,
                },
            ),
            Err(OrderError::InvalidTransition(_))
        ));
    }

    #[test]
    fn reseating_after_clear_gets_fresh_order() {
        let (tables, orders, table) = setup();
        let first = orders
            .quick_add(&table.id, &add_request(item(1, "Paella", "9.99", 1)))
            .unwrap();
        orders.complete(&first.order_id, None).unwrap();
        tables
            .set_status(&table.id, TableStatus::Available)
            .unwrap();

        let second = orders.seat(&table.id, &SeatRequest::default()).unwrap();
        assert_ne!(first.order_id, second.order_id);
        assert_ne!(first.order_number, second.order_number);
    }
}
