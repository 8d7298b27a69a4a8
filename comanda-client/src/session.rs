//! Table session - optimistic order view + reconciliation
//!
//! One session drives one table's cart from one terminal. Every mutation is
//! applied to the local view immediately through the shared cart engine and
//! queued for persistence; [`TableSession::flush`] submits queued mutations
//! strictly in the order they were issued.
//!
//! # Reconciliation rules
//!
//! - On success the server's returned order is authoritative: it replaces
//!   the local view once the queue drains, and persisted ids replace
//!   provisional ones as soon as they are known.
//! - On transport failure ([`ClientError::PersistenceUnavailable`]) the
//!   optimistic view is retained, the mutation stays queued, and the error
//!   is surfaced so the caller can retry. Request ids make that retry safe
//!   even when the first attempt reached the server and only the response
//!   was lost.
//! - On [`ClientError::MalformedResponse`] the pre-call optimistic state is
//!   kept and a warning surfaced.
//!
//! A provisional (locally generated) id is never sent to the server: new
//! items travel as create payloads, and queued edits referencing a
//! provisional id are re-pointed at the persisted id once the create has
//! been acknowledged.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use shared::order::cart;
use shared::order::requests::{
    CartAddRequest, CompleteAndClearRequest, CompleteRequest, NewItemRequest, SeatRequest,
};
use shared::order::{CartItemInput, ItemChanges, OrderSnapshot, OrderStatus, OrderType};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::OrderApi;
use crate::error::{ClientError, ClientResult};

/// One queued, not-yet-confirmed mutation
#[derive(Debug, Clone)]
struct PendingMutation {
    request_id: String,
    mutation: Mutation,
    /// Provisional item id this mutation creates, if any
    provisional_item: Option<String>,
}

#[derive(Debug, Clone)]
enum Mutation {
    Seat {
        guest_count: i32,
        special_instructions: Option<String>,
    },
    QuickAdd {
        item: CartItemInput,
    },
    AppendItem {
        item: CartItemInput,
    },
    EditItem {
        item_id: String,
        changes: ItemChanges,
    },
    RemoveItem {
        item_id: String,
    },
    Complete,
    CompleteAndClear,
}

impl Mutation {
    fn rewrite_item_id(&mut self, old: &str, new: &str) {
        match self {
            Mutation::EditItem { item_id, .. } | Mutation::RemoveItem { item_id }
                if item_id == old =>
            {
                *item_id = new.to_string();
            }
            _ => {}
        }
    }
}

/// Optimistic cart session for one table
pub struct TableSession {
    api: Arc<dyn OrderApi>,
    table_id: String,
    view: Option<OrderSnapshot>,
    /// Persisted order id, once known. The view's own id may be provisional.
    server_order_id: Option<String>,
    /// Line-item ids that exist only locally so far
    provisional_items: HashSet<String>,
    queue: VecDeque<PendingMutation>,
    cancel: CancellationToken,
}

impl TableSession {
    pub fn new(api: Arc<dyn OrderApi>, table_id: impl Into<String>) -> Self {
        Self {
            api,
            table_id: table_id.into(),
            view: None,
            server_order_id: None,
            provisional_items: HashSet::new(),
            queue: VecDeque::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// The optimistic order view, if the session holds one
    pub fn view(&self) -> Option<&OrderSnapshot> {
        self.view.as_ref()
    }

    /// Number of mutations awaiting persistence
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Whether the local view is ahead of the server
    pub fn is_dirty(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Cancel in-flight and future persistence work. Navigating away from
    /// the table view calls this so late results never touch a dead view.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Consume the session, cancelling outstanding work
    pub fn close(self) {
        self.cancel.cancel();
    }

    // ========== Optimistic Mutations ==========

    /// Seat the table: create an optimistic PENDING dine-in order and queue
    /// its creation
    pub fn seat(
        &mut self,
        guest_count: i32,
        special_instructions: Option<String>,
    ) -> ClientResult<&OrderSnapshot> {
        if self.view.is_some() {
            return Err(ClientError::Conflict(
                "session already holds an order".to_string(),
            ));
        }

        let mut order = self.provisional_order();
        order.guest_count = guest_count.max(1);
        order.special_instructions = special_instructions.clone();
        self.view = Some(order);

        self.enqueue(
            Mutation::Seat {
                guest_count,
                special_instructions,
            },
            None,
        );
        Ok(self.view.as_ref().expect("view just set"))
    }

    /// Quick-add an item (coalescing path). Opens a provisional order first
    /// if the session has none; returns the affected line-item id.
    pub fn quick_add(&mut self, item: CartItemInput) -> ClientResult<String> {
        self.ensure_open()?;
        if self.view.is_none() {
            self.view = Some(self.provisional_order());
        }

        let view = self.view.as_mut().expect("view ensured");
        let existed = view.find_item_by_product(item.product_id).is_some();
        let item_id = cart::add_item(view, &item)?;

        let provisional = if existed {
            None
        } else {
            self.provisional_items.insert(item_id.clone());
            Some(item_id.clone())
        };
        self.enqueue(Mutation::QuickAdd { item }, provisional);
        Ok(item_id)
    }

    /// Explicitly add a new entry (never coalesces); returns the line-item id
    pub fn append_item(&mut self, item: CartItemInput) -> ClientResult<String> {
        let view = self.require_view()?;
        let item_id = cart::append_item(view, &item)?;
        self.provisional_items.insert(item_id.clone());
        self.enqueue(Mutation::AppendItem { item }, Some(item_id.clone()));
        Ok(item_id)
    }

    /// Edit one line item's quantity/notes
    pub fn edit_item(&mut self, item_id: &str, changes: ItemChanges) -> ClientResult<()> {
        let view = self.require_view()?;
        cart::edit_item(view, item_id, &changes)?;
        self.enqueue(
            Mutation::EditItem {
                item_id: item_id.to_string(),
                changes,
            },
            None,
        );
        Ok(())
    }

    /// Remove one line item outright
    pub fn remove_item(&mut self, item_id: &str) -> ClientResult<()> {
        let view = self.require_view()?;
        cart::remove_item(view, item_id)?;
        self.drop_queued_for_item(item_id);
        self.enqueue(
            Mutation::RemoveItem {
                item_id: item_id.to_string(),
            },
            None,
        );
        Ok(())
    }

    /// Increase quantity by one. Persisted as an absolute quantity edit so
    /// replays cannot drift.
    pub fn increment_item(&mut self, item_id: &str) -> ClientResult<()> {
        let view = self.require_view()?;
        cart::increment_item(view, item_id)?;
        let quantity = view
            .find_item(item_id)
            .map(|i| i.quantity)
            .ok_or_else(|| ClientError::NotFound(format!("Item {} not found", item_id)))?;
        self.enqueue(
            Mutation::EditItem {
                item_id: item_id.to_string(),
                changes: ItemChanges {
                    quantity: Some(quantity),
                    notes: None,
                },
            },
            None,
        );
        Ok(())
    }

    /// Decrease quantity by one; quantity 1 removes the item
    pub fn decrement_item(&mut self, item_id: &str) -> ClientResult<()> {
        let view = self.require_view()?;
        cart::decrement_item(view, item_id)?;

        match self.view.as_ref().and_then(|v| v.find_item(item_id)) {
            Some(item) => {
                let quantity = item.quantity;
                self.enqueue(
                    Mutation::EditItem {
                        item_id: item_id.to_string(),
                        changes: ItemChanges {
                            quantity: Some(quantity),
                            notes: None,
                        },
                    },
                    None,
                );
            }
            None => {
                // Dropped to zero: the item is gone
                self.drop_queued_for_item(item_id);
                self.enqueue(
                    Mutation::RemoveItem {
                        item_id: item_id.to_string(),
                    },
                    None,
                );
            }
        }
        Ok(())
    }

    /// Mark the order completed locally and queue the completion
    pub fn complete(&mut self) -> ClientResult<()> {
        let view = self.require_view()?;
        if view.is_terminal() {
            return Err(ClientError::InvalidTransition(format!(
                "order is already {:?}",
                view.status
            )));
        }
        view.status = OrderStatus::Completed;
        self.enqueue(Mutation::Complete, None);
        Ok(())
    }

    /// Complete the order and clear the table as one logical operation
    pub fn complete_and_clear(&mut self) -> ClientResult<()> {
        let view = self.require_view()?;
        if view.is_terminal() {
            return Err(ClientError::InvalidTransition(format!(
                "order is already {:?}",
                view.status
            )));
        }
        view.status = OrderStatus::Completed;
        self.enqueue(Mutation::CompleteAndClear, None);
        Ok(())
    }

    // ========== Persistence ==========

    /// Submit queued mutations to the server, strictly in issue order.
    ///
    /// Stops at the first failure, leaving that mutation (and everything
    /// after it) queued; returns how many mutations were confirmed.
    pub async fn flush(&mut self) -> ClientResult<usize> {
        let mut applied = 0;

        while let Some(pending) = self.queue.front().cloned() {
            if self.cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }

            let result = tokio::select! {
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                r = self.dispatch(&pending) => r,
            };

            match result {
                Ok(server_order) => {
                    let pending = self.queue.pop_front().expect("queue front");
                    self.reconcile(&pending, server_order);
                    applied += 1;
                }
                Err(e) => {
                    match &e {
                        ClientError::PersistenceUnavailable(msg) => {
                            tracing::warn!(
                                table_id = %self.table_id,
                                error = %msg,
                                pending = self.queue.len(),
                                "Persistence failed; local view retained for retry"
                            );
                        }
                        ClientError::MalformedResponse(msg) => {
                            tracing::warn!(
                                table_id = %self.table_id,
                                error = %msg,
                                "Server response could not be normalized; keeping optimistic state"
                            );
                        }
                        _ => {}
                    }
                    return Err(e);
                }
            }
        }

        Ok(applied)
    }

    /// Re-fetch the authoritative order. Only valid with an empty queue;
    /// flushing first keeps local edits from being silently discarded.
    pub async fn refresh(&mut self) -> ClientResult<&OrderSnapshot> {
        if self.is_dirty() {
            return Err(ClientError::Validation(
                "pending mutations; flush before refreshing".to_string(),
            ));
        }
        let order = self.api.current_for_table(&self.table_id).await?;
        self.server_order_id = Some(order.order_id.clone());
        self.view = Some(order);
        Ok(self.view.as_ref().expect("view just set"))
    }

    // ========== Internals ==========

    fn provisional_order(&self) -> OrderSnapshot {
        let mut order = OrderSnapshot::new(
            format!("local-{}", Uuid::new_v4()),
            String::new(),
            OrderType::DineIn,
        );
        order.table_id = Some(self.table_id.clone());
        order
    }

    fn enqueue(&mut self, mutation: Mutation, provisional_item: Option<String>) {
        self.queue.push_back(PendingMutation {
            request_id: Uuid::new_v4().to_string(),
            mutation,
            provisional_item,
        });
    }

    fn require_view(&mut self) -> ClientResult<&mut OrderSnapshot> {
        self.ensure_open()?;
        self.view
            .as_mut()
            .ok_or_else(|| ClientError::Validation("no active order for this table".to_string()))
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if let Some(view) = &self.view
            && view.is_terminal()
        {
            return Err(ClientError::InvalidTransition(format!(
                "order is already {:?}",
                view.status
            )));
        }
        Ok(())
    }

    /// A mutation for an item that never reached the server is pointless
    /// once the item is locally gone; drop creates/edits queued for it.
    fn drop_queued_for_item(&mut self, item_id: &str) {
        if !self.provisional_items.contains(item_id) {
            // Persisted item: the server must see the removal; keep edits in
            // order so the quantity history stays sane
            return;
        }
        self.queue.retain(|p| {
            !matches!(
                &p.mutation,
                Mutation::EditItem { item_id: id, .. } if id == item_id
            )
        });
    }

    fn persisted_order_id(&self) -> ClientResult<String> {
        self.server_order_id
            .clone()
            .ok_or_else(|| ClientError::Validation("order not persisted yet".to_string()))
    }

    /// Guard: a provisional id must never cross the wire
    fn persisted_item_id(&self, item_id: &str) -> ClientResult<String> {
        if self.provisional_items.contains(item_id) {
            return Err(ClientError::Validation(format!(
                "item {} has not been persisted yet",
                item_id
            )));
        }
        Ok(item_id.to_string())
    }

    async fn dispatch(&self, pending: &PendingMutation) -> ClientResult<OrderSnapshot> {
        let request_id = Some(pending.request_id.clone());
        match &pending.mutation {
            Mutation::Seat {
                guest_count,
                special_instructions,
            } => {
                self.api
                    .seat(
                        &self.table_id,
                        &SeatRequest {
                            guest_count: *guest_count,
                            special_instructions: special_instructions.clone(),
                            request_id,
                        },
                    )
                    .await
            }
            Mutation::QuickAdd { item } => {
                self.api
                    .cart_add(
                        &self.table_id,
                        &CartAddRequest {
                            item: item.clone(),
                            guest_count: None,
                            special_instructions: None,
                            request_id,
                        },
                    )
                    .await
            }
            Mutation::AppendItem { item } => {
                let order_id = self.persisted_order_id()?;
                self.api
                    .append_item(
                        &order_id,
                        &NewItemRequest {
                            item: item.clone(),
                            request_id,
                        },
                    )
                    .await
            }
            Mutation::EditItem { item_id, changes } => {
                let order_id = self.persisted_order_id()?;
                let item_id = self.persisted_item_id(item_id)?;
                self.api.edit_item(&order_id, &item_id, changes).await
            }
            Mutation::RemoveItem { item_id } => {
                let order_id = self.persisted_order_id()?;
                let item_id = self.persisted_item_id(item_id)?;
                self.api.remove_item(&order_id, &item_id).await
            }
            Mutation::Complete => {
                let order_id = self.persisted_order_id()?;
                self.api
                    .complete(&order_id, &CompleteRequest { request_id })
                    .await
            }
            Mutation::CompleteAndClear => {
                let order_id = self.persisted_order_id()?;
                self.api
                    .complete_and_clear(
                        &order_id,
                        &CompleteAndClearRequest {
                            next_status: None,
                            request_id,
                        },
                    )
                    .await
                    .map(|result| result.order)
            }
        }
    }

    /// Fold a confirmed mutation's server response into the session
    fn reconcile(&mut self, pending: &PendingMutation, server: OrderSnapshot) {
        self.server_order_id = Some(server.order_id.clone());

        // Re-point the provisional item this mutation created at its
        // persisted id, in the view and in every queued mutation
        if let Some(provisional_id) = &pending.provisional_item {
            let product_id = match &pending.mutation {
                Mutation::QuickAdd { item } | Mutation::AppendItem { item } => {
                    Some(item.product_id)
                }
                _ => None,
            };

            if let Some(product_id) = product_id {
                let server_id = match &pending.mutation {
                    // Quick add may have coalesced into an existing line
                    Mutation::QuickAdd { .. } => server
                        .items
                        .iter()
                        .find(|i| i.product_id == product_id)
                        .map(|i| i.id.clone()),
                    // An explicit append is the newest entry for the product
                    _ => server
                        .items
                        .iter()
                        .rev()
                        .find(|i| i.product_id == product_id)
                        .map(|i| i.id.clone()),
                };
                if let Some(server_id) = server_id {
                    self.alias_item(provisional_id, &server_id);
                }
            }
            self.provisional_items.remove(provisional_id);
        }

        // Once the queue is drained the server is authoritative
        if self.queue.is_empty() {
            self.view = Some(server);
            self.provisional_items.clear();
        }
    }

    fn alias_item(&mut self, old: &str, new: &str) {
        self.provisional_items.remove(old);
        if let Some(view) = self.view.as_mut()
            && let Some(item) = view.items.iter_mut().find(|i| i.id == old)
        {
            item.id = new.to_string();
        }
        for pending in self.queue.iter_mut() {
            pending.mutation.rewrite_item_id(old, new);
        }
    }
}
