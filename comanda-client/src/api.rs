//! Order API seam
//!
//! [`OrderApi`] abstracts the HTTP surface the reconciliation layer talks
//! to; tests substitute an in-memory fake.

use async_trait::async_trait;
use shared::models::ProductSnapshot;
use shared::order::requests::{
    CartAddRequest, CartRemoveRequest, CompleteAndClearRequest, CompleteRequest, NewItemRequest,
    OrderUpdate, SeatRequest,
};
use shared::order::{CompletedOrder, ItemChanges, OrderSnapshot};

use crate::{ClientResult, HttpClient};

/// Read-only catalog lookups, supplied by the product-catalog collaborator.
/// The floor service only snapshots the result onto line items.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_product(&self, product_id: i64) -> ClientResult<ProductSnapshot>;

    async fn list_products(&self, category: Option<&str>) -> ClientResult<Vec<ProductSnapshot>>;
}

#[async_trait]
impl CatalogApi for HttpClient {
    async fn get_product(&self, product_id: i64) -> ClientResult<ProductSnapshot> {
        self.get(&format!("/api/products/{}", product_id)).await
    }

    async fn list_products(&self, category: Option<&str>) -> ClientResult<Vec<ProductSnapshot>> {
        match category {
            Some(category) => {
                self.get(&format!("/api/products?category={}", category))
                    .await
            }
            None => self.get("/api/products").await,
        }
    }
}

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn seat(&self, table_id: &str, req: &SeatRequest) -> ClientResult<OrderSnapshot>;

    async fn cart_add(&self, table_id: &str, req: &CartAddRequest) -> ClientResult<OrderSnapshot>;

    async fn cart_remove(
        &self,
        table_id: &str,
        req: &CartRemoveRequest,
    ) -> ClientResult<OrderSnapshot>;

    async fn current_for_table(&self, table_id: &str) -> ClientResult<OrderSnapshot>;

    async fn append_item(&self, order_id: &str, req: &NewItemRequest)
    -> ClientResult<OrderSnapshot>;

    async fn edit_item(
        &self,
        order_id: &str,
        item_id: &str,
        changes: &ItemChanges,
    ) -> ClientResult<OrderSnapshot>;

    async fn remove_item(&self, order_id: &str, item_id: &str) -> ClientResult<OrderSnapshot>;

    async fn update_order(&self, order_id: &str, update: &OrderUpdate)
    -> ClientResult<OrderSnapshot>;

    async fn complete(&self, order_id: &str, req: &CompleteRequest) -> ClientResult<OrderSnapshot>;

    async fn complete_and_clear(
        &self,
        order_id: &str,
        req: &CompleteAndClearRequest,
    ) -> ClientResult<CompletedOrder>;
}

#[async_trait]
impl OrderApi for HttpClient {
    async fn seat(&self, table_id: &str, req: &SeatRequest) -> ClientResult<OrderSnapshot> {
        self.post(&format!("/api/orders/table/{}", table_id), req)
            .await
    }

    async fn cart_add(&self, table_id: &str, req: &CartAddRequest) -> ClientResult<OrderSnapshot> {
        self.post(&format!("/api/orders/table/{}/cart", table_id), req)
            .await
    }

    async fn cart_remove(
        &self,
        table_id: &str,
        req: &CartRemoveRequest,
    ) -> ClientResult<OrderSnapshot> {
        self.delete(&format!("/api/orders/table/{}/cart", table_id), req)
            .await
    }

    async fn current_for_table(&self, table_id: &str) -> ClientResult<OrderSnapshot> {
        self.get(&format!("/api/orders/table/{}/current", table_id))
            .await
    }

    async fn append_item(
        &self,
        order_id: &str,
        req: &NewItemRequest,
    ) -> ClientResult<OrderSnapshot> {
        self.post(&format!("/api/orders/{}/items", order_id), req)
            .await
    }

    async fn edit_item(
        &self,
        order_id: &str,
        item_id: &str,
        changes: &ItemChanges,
    ) -> ClientResult<OrderSnapshot> {
        self.patch(&format!("/api/orders/{}/items/{}", order_id, item_id), changes)
            .await
    }

    async fn remove_item(&self, order_id: &str, item_id: &str) -> ClientResult<OrderSnapshot> {
        self.delete(
            &format!("/api/orders/{}/items/{}", order_id, item_id),
            &serde_json::json!({}),
        )
        .await
    }

    async fn update_order(
        &self,
        order_id: &str,
        update: &OrderUpdate,
    ) -> ClientResult<OrderSnapshot> {
        self.put(&format!("/api/orders/{}", order_id), update).await
    }

    async fn complete(&self, order_id: &str, req: &CompleteRequest) -> ClientResult<OrderSnapshot> {
        self.patch(&format!("/api/orders/{}/complete", order_id), req)
            .await
    }

    async fn complete_and_clear(
        &self,
        order_id: &str,
        req: &CompleteAndClearRequest,
    ) -> ClientResult<CompletedOrder> {
        self.post(&format!("/api/orders/{}/complete-and-clear", order_id), req)
            .await
    }
}
