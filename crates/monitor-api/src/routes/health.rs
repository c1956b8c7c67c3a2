//! `GET /health` — liveness only. Never touches the store, so it answers
//! even if SQLite is momentarily wedged.

use crate::models::ApiResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn health_check() -> Json<ApiResponse<HealthBody>> {
    Json(ApiResponse::success(HealthBody { status: "healthy" }))
}
