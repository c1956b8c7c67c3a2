//! `GET /metrics`, `GET /metrics/<service>`, `GET /metrics/experiment`
//! (§4.E, §6). The literal `experiment` segment takes priority over the
//! `:service` wildcard at the same path depth (axum/matchit resolves
//! static segments before dynamic ones), so a service named "experiment"
//! can never exist in a way that shadows the compliance endpoint.

use super::WindowQuery;
use crate::models::{ApiError, ApiResponse, ApiResult};
use crate::ApiState;
use axum::extract::{Path, Query, State};
use axum::Json;
use monitor_common::ServiceName;
use monitor_metrics::{ExperimentSummary, FleetMetrics, ServiceMetrics};
use std::sync::Arc;

pub async fn fleet_metrics(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<FleetMetrics> {
    let window_hours = query.resolve()?;
    let metrics = state.metrics.fleet_metrics(window_hours).await?;
    Ok(Json(ApiResponse::success(metrics)))
}

pub async fn one_service_metrics(
    State(state): State<Arc<ApiState>>,
    Path(service): Path<String>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<ServiceMetrics> {
    let window_hours = query.resolve()?;
    let name = ServiceName::from(service);
    if !state.catalog.contains(&name) {
        return Err(ApiError::not_found(format!("unknown service: {name}")));
    }
    let metrics = state.metrics.service_metrics(&name, window_hours).await?;
    Ok(Json(ApiResponse::success(metrics)))
}

pub async fn experiment(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<ExperimentSummary> {
    let window_hours = query.resolve()?;
    let summary = state.metrics.experiment_summary(window_hours).await?;
    Ok(Json(ApiResponse::success(summary)))
}
