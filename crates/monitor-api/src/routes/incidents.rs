//! `GET /incidents`, `GET /incidents/<service>`, `GET /incidents/active`
//! (§6). As in `routes::metrics`, the literal `active` segment is
//! resolved before the `:service` wildcard.

use super::LimitQuery;
use crate::models::{ApiError, ApiResponse, ApiResult};
use crate::ApiState;
use axum::extract::{Path, Query, State};
use axum::Json;
use monitor_common::{Incident, ServiceName};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 50;

pub async fn list_incidents(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<Incident>> {
    let limit = query.resolve(DEFAULT_LIMIT)?;
    let incidents = state.store.incidents(None, limit).await?;
    Ok(Json(ApiResponse::success(incidents)))
}

pub async fn service_incidents(
    State(state): State<Arc<ApiState>>,
    Path(service): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<Incident>> {
    let limit = query.resolve(DEFAULT_LIMIT)?;
    let name = ServiceName::from(service);
    if !state.catalog.contains(&name) {
        return Err(ApiError::not_found(format!("unknown service: {name}")));
    }
    let incidents = state.store.incidents(Some(&name), limit).await?;
    Ok(Json(ApiResponse::success(incidents)))
}

pub async fn active_incidents(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<Incident>> {
    let mut active = Vec::new();
    for name in state.catalog.all_service_names() {
        if let Some(incident) = state.store.active_incident(&name).await? {
            active.push(incident);
        }
    }
    Ok(Json(ApiResponse::success(active)))
}
