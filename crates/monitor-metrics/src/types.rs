//! Metrics output shapes, serialized directly by the Read API.

use serde::Serialize;
use std::collections::HashMap;

/// Mean/min/max over some measured quantity; each field is `None` when
/// there is no data to compute from (never fabricated zeros).
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct Stat {
    /// Arithmetic mean.
    pub avg_seconds: Option<f64>,
    /// Minimum observed value.
    pub min_seconds: Option<f64>,
    /// Maximum observed value.
    pub max_seconds: Option<f64>,
}

/// Incident counts for one service.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct IncidentCounts {
    /// Total incidents considered (bounded by the query limit).
    pub total: usize,
    /// Currently open (`resolved_at IS NULL`).
    pub active: usize,
    /// Already closed.
    pub resolved: usize,
}

/// Availability over a window.
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct Availability {
    /// `None` when `window_hours == 0` (§8 boundary case).
    pub percent: Option<f64>,
    /// Downtime seconds summed over the window, clamped to the window's
    /// duration. `None` under the same `window_hours == 0` condition.
    pub total_downtime_seconds: Option<f64>,
}

/// Health-check sample statistics (bounded most-recent sample, §4.E).
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct HealthCheckStats {
    /// Sample size actually read (≤ the bounded cap).
    pub total: usize,
    /// Non-failure checks in the sample.
    pub successful: usize,
    /// Failure checks in the sample.
    pub failed: usize,
    /// `successful / total * 100`; `100.0` when `total == 0` (vacuously
    /// healthy — mirrors the original's `if total_checks > 0 else 100.0`).
    pub success_rate_percent: f64,
    /// Mean of every check's `latency_ms` that was present.
    pub avg_latency_ms: Option<f64>,
}

/// Full metrics snapshot for one service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMetrics {
    /// Service this snapshot is for.
    pub service: String,
    /// Incident counts.
    pub incidents: IncidentCounts,
    /// MTTD (time to detect) distribution across all incidents in window.
    pub mttd: Stat,
    /// MTTR (time to recover) distribution across resolved incidents.
    pub mttr: Stat,
    /// MTBF mean, `None` with fewer than two resolved incidents.
    pub mtbf_avg_seconds: Option<f64>,
    /// Availability over the requested window.
    pub availability: Availability,
    /// Health-check sample statistics.
    pub health_checks: HealthCheckStats,
}

/// Fleet-wide aggregate, mirroring the original's `_global` entry.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalMetrics {
    /// Total incidents across every service (bounded by the query limit).
    pub total_incidents: usize,
    /// Currently open, across every service.
    pub active_incidents: usize,
    /// Mean MTTD across every incident, fleet-wide.
    pub mttd_avg_seconds: Option<f64>,
    /// Mean MTTR across every resolved incident, fleet-wide.
    pub mttr_avg_seconds: Option<f64>,
    /// Fleet-wide availability over the requested window.
    pub availability: Availability,
}

/// Per-service metrics keyed by service name, plus the `_global` roll-up.
#[derive(Debug, Clone, Serialize)]
pub struct FleetMetrics {
    /// One entry per catalog service (including the broker tag).
    pub services: HashMap<String, ServiceMetrics>,
    /// Fleet-wide roll-up.
    pub global: GlobalMetrics,
}

/// ASR-03 "three nines" monthly downtime-budget compliance projection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Asr03Compliance {
    /// Whether the projected monthly downtime is within budget. `None`
    /// when the projection itself is undefined (`window_hours == 0`).
    pub compliant: Option<bool>,
    /// Linear extrapolation of the observed window's downtime to 30 days.
    pub projected_monthly_downtime_minutes: Option<f64>,
    /// The fixed budget: 21.6 minutes/month.
    pub max_allowed_monthly_downtime_minutes: f64,
    /// `max_allowed - projected`; negative means over budget.
    pub margin_minutes: Option<f64>,
}

/// The `/metrics/experiment` response: ASR-03 compliance plus the global
/// and per-service metrics it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    /// The window the caller requested.
    pub experiment_window_hours: f64,
    /// ASR-03 compliance projection.
    pub asr03_compliance: Asr03Compliance,
    /// The fleet metrics the projection was derived from.
    pub metrics: FleetMetrics,
}
