//! `GET /ops/<operation_id>` — read-only accessor over the `operations`
//! table, present in the original `app/api_gateway/gateway.py`'s
//! `status_url` and carried here for completeness of the Store's read
//! surface (§6 supplement). No write path exists; operation creation and
//! processing belong to the external gateway/worker.

use crate::models::{ApiError, ApiResponse, ApiResult};
use crate::ApiState;
use axum::extract::{Path, State};
use axum::Json;
use monitor_common::Operation;
use std::sync::Arc;

pub async fn get_operation(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> ApiResult<Operation> {
    match state.store.get_operation(&id).await? {
        Some(operation) => Ok(Json(ApiResponse::success(operation))),
        None => Err(ApiError::not_found(format!("unknown operation: {id}"))),
    }
}
