//! `GET /health-checks/<service>?limit=L` (§6).

use super::LimitQuery;
use crate::models::{ApiError, ApiResponse, ApiResult};
use crate::ApiState;
use axum::extract::{Path, Query, State};
use axum::Json;
use monitor_common::{HealthCheck, ServiceName};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 50;

pub async fn service_health_checks(
    State(state): State<Arc<ApiState>>,
    Path(service): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<HealthCheck>> {
    let limit = query.resolve(DEFAULT_LIMIT)?;
    let name = ServiceName::from(service);
    if !state.catalog.contains(&name) {
        return Err(ApiError::not_found(format!("unknown service: {name}")));
    }
    let checks = state.store.recent_checks(&name, limit).await?;
    Ok(Json(ApiResponse::success(checks)))
}
