//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::open_order))
        .route("/table/{table_id}", post(handler::seat))
        .route(
            "/table/{table_id}/cart",
            post(handler::cart_add).delete(handler::cart_remove),
        )
        .route("/table/{table_id}/current", get(handler::current_for_table))
        .route("/{order_id}", get(handler::get_by_id).put(handler::update))
        .route("/{order_id}/items", post(handler::append_item))
        .route(
            "/{order_id}/items/{item_id}",
            patch(handler::edit_item).delete(handler::remove_item),
        )
        .route("/{order_id}/complete", patch(handler::complete))
        .route(
            "/{order_id}/complete-and-clear",
            post(handler::complete_and_clear),
        )
}
