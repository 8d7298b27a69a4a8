//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde::Serialize;
use shared::ApiResponse;

use crate::core::ServerState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: i64,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "ok",
        timestamp: shared::util::now_millis(),
    }))
}
