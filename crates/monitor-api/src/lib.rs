//! Read API (§4.G, §6): read-only HTTP query surface over the Store,
//! Incident Detector, and Metrics Engine, plus two operator-facing write
//! paths (`POST /ping`, `POST /evaluate`) that force a tick or a sweep
//! rather than mutating the data model directly.
//!
//! Built with `axum` + `tower` + `tower-http`, matching the teacher's
//! `api/` crate (`build_router`, `ApiState`, `routes::health::health_check`).
//! No OpenAPI/Swagger surface is carried over — it documents a large
//! multi-tenant product surface this spec does not have (see DESIGN.md).

#![warn(missing_docs)]

pub mod models;
pub mod routes;

pub use models::{ApiError, ApiResponse};

use axum::routing::{get, post};
use axum::Router;
use monitor_common::ServiceCatalog;
use monitor_metrics::MetricsEngine;
use monitor_scheduler::Scheduler;
use monitor_store::Store;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handle every route handler reads from. Cheap to clone (each
/// field is already an `Arc`); constructed once by the binary entry point
/// and wrapped once more in `build_router`.
pub struct ApiState {
    /// Store, for incidents/health-checks/operations accessors.
    pub store: Arc<dyn Store>,
    /// Metrics Engine, for `/metrics*`.
    pub metrics: Arc<MetricsEngine>,
    /// Scheduler, for `/status`, `/ping`, `/evaluate`.
    pub scheduler: Arc<Scheduler>,
    /// Catalog, to validate `service` path segments before querying.
    pub catalog: Arc<ServiceCatalog>,
}

/// Assemble the full Read API router. No write paths exist over the data
/// model itself — `/ping` and `/evaluate` only force the Scheduler/Detector
/// to run out-of-band; they do not let a caller fabricate a check or
/// incident.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/status", get(routes::status::get_status))
        .route("/metrics", get(routes::metrics::fleet_metrics))
        .route("/metrics/experiment", get(routes::metrics::experiment))
        .route("/metrics/:service", get(routes::metrics::one_service_metrics))
        .route("/incidents", get(routes::incidents::list_incidents))
        .route("/incidents/active", get(routes::incidents::active_incidents))
        .route("/incidents/:service", get(routes::incidents::service_incidents))
        .route("/health-checks/:service", get(routes::health_checks::service_health_checks))
        .route("/ops/:operation_id", get(routes::operations::get_operation))
        .route("/ping", post(routes::control::force_ping))
        .route("/evaluate", post(routes::control::force_evaluate))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
