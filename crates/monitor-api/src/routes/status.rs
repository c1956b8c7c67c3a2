//! `GET /status` — the Scheduler's live counters (§6).

use crate::models::ApiResponse;
use crate::ApiState;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusBody {
    running: bool,
    ping_interval_seconds: f64,
    ping_count: u64,
    echo_count: u64,
    last_ping_time: Option<DateTime<Utc>>,
    last_echo_time: Option<DateTime<Utc>>,
}

pub async fn get_status(State(state): State<Arc<ApiState>>) -> Json<ApiResponse<StatusBody>> {
    let snapshot = state.scheduler.status().snapshot();
    Json(ApiResponse::success(StatusBody {
        running: snapshot.running,
        ping_interval_seconds: snapshot.ping_interval_seconds,
        ping_count: snapshot.ping_count,
        echo_count: snapshot.echo_count,
        last_ping_time: snapshot.last_ping_time,
        last_echo_time: snapshot.last_echo_time,
    }))
}
