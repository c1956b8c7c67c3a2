//! `HealthCheck` — one immutable record per probe attempt.
//!
//! Mirrors `app/models/monitoring.py::HealthCheck` from the original
//! implementation, with `status` promoted from a bare string to a closed
//! enum and `is_failure` kept as the single source of truth for what
//! counts as a failure (note: DEGRADED is deliberately not a failure).

use crate::ids::ServiceName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification for a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    /// 2xx response received.
    Up,
    /// Connection refused, DNS failure, or other transport exception.
    Down,
    /// The probe deadline elapsed before a response arrived.
    Timeout,
    /// A non-2xx HTTP response was received — degraded, not down.
    Degraded,
    /// Reported by the probed service itself (e.g. a worker signalling a
    /// recent business-operation failure); treated as a failure.
    Unhealthy,
}

impl CheckStatus {
    /// DOWN, TIMEOUT, and UNHEALTHY count as failures; DEGRADED does not.
    pub fn is_failure(self) -> bool {
        matches!(self, CheckStatus::Down | CheckStatus::Timeout | CheckStatus::Unhealthy)
    }
}

/// One probe attempt against one service.
///
/// Immutable after insertion. Within a `service`, `id` order reflects probe
/// *send* order and is authoritative for the detector — `timestamp` is
/// informational only (see the spec's Open Questions on clock skew).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Monotonic id assigned by the Store on insertion; `0` before insertion.
    pub id: i64,
    /// Service this check targeted.
    pub service: ServiceName,
    /// Correlation id of the tick that produced this check.
    pub request_id: String,
    /// Classified outcome.
    pub status: CheckStatus,
    /// Round-trip time in milliseconds; present whenever a response (or a
    /// timeout) was observed, even on failure.
    pub latency_ms: Option<f64>,
    /// HTTP status code, when one was received.
    pub http_code: Option<u16>,
    /// Moment the probe was sent (UTC).
    pub timestamp: DateTime<Utc>,
    /// True iff the probe deadline elapsed (`status == Timeout` implies this).
    pub is_timeout: bool,
    /// Human-readable error detail, when the probe failed.
    pub error_message: Option<String>,
}

impl HealthCheck {
    /// True iff this check represents a failure (`is_failure` in the spec).
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Construct a not-yet-persisted UP check.
    pub fn up(
        service: ServiceName,
        request_id: impl Into<String>,
        latency_ms: f64,
        http_code: u16,
    ) -> Self {
        Self {
            id: 0,
            service,
            request_id: request_id.into(),
            status: CheckStatus::Up,
            latency_ms: Some(latency_ms),
            http_code: Some(http_code),
            timestamp: Utc::now(),
            is_timeout: false,
            error_message: None,
        }
    }

    /// Construct a not-yet-persisted DOWN check.
    pub fn down(
        service: ServiceName,
        request_id: impl Into<String>,
        latency_ms: f64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            service,
            request_id: request_id.into(),
            status: CheckStatus::Down,
            latency_ms: Some(latency_ms),
            http_code: None,
            timestamp: Utc::now(),
            is_timeout: false,
            error_message: Some(error_message.into()),
        }
    }

    /// Construct a not-yet-persisted TIMEOUT check.
    pub fn timeout(service: ServiceName, request_id: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            id: 0,
            service,
            request_id: request_id.into(),
            status: CheckStatus::Timeout,
            latency_ms: Some(latency_ms),
            http_code: None,
            timestamp: Utc::now(),
            is_timeout: true,
            error_message: Some("timeout".to_string()),
        }
    }

    /// Construct a not-yet-persisted DEGRADED check (non-2xx response).
    pub fn degraded(
        service: ServiceName,
        request_id: impl Into<String>,
        latency_ms: f64,
        http_code: u16,
    ) -> Self {
        Self {
            id: 0,
            service,
            request_id: request_id.into(),
            status: CheckStatus::Degraded,
            latency_ms: Some(latency_ms),
            http_code: Some(http_code),
            timestamp: Utc::now(),
            is_timeout: false,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_is_not_a_failure() {
        let c = HealthCheck::degraded("reserves".into(), "req-1", 12.0, 503);
        assert!(!c.is_failure());
    }

    #[test]
    fn down_timeout_unhealthy_are_failures() {
        assert!(HealthCheck::down("x".into(), "r", 1.0, "boom").is_failure());
        assert!(HealthCheck::timeout("x".into(), "r", 5000.0).is_failure());
        let mut unhealthy = HealthCheck::up("x".into(), "r", 1.0, 200);
        unhealthy.status = CheckStatus::Unhealthy;
        assert!(unhealthy.is_failure());
    }

    #[test]
    fn up_is_not_a_failure() {
        assert!(!HealthCheck::up("x".into(), "r", 1.0, 200).is_failure());
    }
}
