//! `POST /ping`, `POST /evaluate` (§6) — force a tick or a full detector
//! sweep outside the scheduler's own interval, for operator/test use.

use crate::models::{ApiResponse, ApiResult};
use crate::ApiState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct PingBody {
    request_id: String,
}

pub async fn force_ping(State(state): State<Arc<ApiState>>) -> ApiResult<PingBody> {
    let request_id = state.scheduler.tick().await?;
    Ok(Json(ApiResponse::success(PingBody { request_id })))
}

pub async fn force_evaluate(State(state): State<Arc<ApiState>>) -> ApiResult<()> {
    state.scheduler.evaluate_all().await?;
    Ok(Json(ApiResponse::success(())))
}
