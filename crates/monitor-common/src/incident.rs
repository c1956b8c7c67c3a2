//! `Incident` — one outage episode per service.
//!
//! Mirrors `app/models/monitoring.py::Incident`. At most one incident per
//! service may be open (`resolved_at.is_none()`) at a time; that invariant
//! is enforced by the Store (`open_incident`/`active_incident`), not here.

use crate::ids::ServiceName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Incident severity, assigned at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// `consecutive_failures < 2 * n_fail`.
    Warning,
    /// `consecutive_failures >= 2 * n_fail`.
    Critical,
}

/// One outage episode for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Monotonic id assigned by the Store on insertion; `0` before insertion.
    pub id: i64,
    /// Affected service.
    pub service: ServiceName,
    /// Timestamp of the first failure in the triggering streak.
    pub started_at: DateTime<Utc>,
    /// Timestamp the detector opened the incident.
    pub detected_at: DateTime<Utc>,
    /// Timestamp the detector closed the incident, if it has.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Severity assigned at open.
    pub severity: Severity,
    /// Consecutive failure count observed at open.
    pub consecutive_failures: u32,
    /// How the incident was closed (`"auto-recovery"` today).
    pub resolution_action: Option<String>,
    /// `detected_at - started_at`, clamped to zero (clock skew, §9).
    pub mttd_seconds: f64,
    /// `resolved_at - detected_at`, set only once resolved.
    pub mttr_seconds: Option<f64>,
    /// The highest `health_checks.id` observed for this service at the
    /// moment this incident opened. Per §9's Open Question resolution,
    /// the N_ok close confirmation may only count checks with
    /// `id > anchor_check_id` — never checks that predate detection.
    pub anchor_check_id: i64,
}

impl Incident {
    /// Open a new incident for `service`, computing MTTD from
    /// `first_failure_at` to `now`, clamped to zero per §9. `anchor_check_id`
    /// is the id of the newest health check that contributed to the
    /// triggering streak — the floor for N_ok close confirmation.
    pub fn open(
        service: ServiceName,
        first_failure_at: DateTime<Utc>,
        consecutive_failures: u32,
        severity: Severity,
        now: DateTime<Utc>,
        anchor_check_id: i64,
    ) -> Self {
        let mttd = (now - first_failure_at).num_milliseconds() as f64 / 1000.0;
        Self {
            id: 0,
            service,
            started_at: first_failure_at,
            detected_at: now,
            resolved_at: None,
            severity,
            consecutive_failures,
            resolution_action: None,
            mttd_seconds: mttd.max(0.0),
            mttr_seconds: None,
            anchor_check_id,
        }
    }

    /// Close this incident at `now`, recording MTTR.
    pub fn resolve(&mut self, action: impl Into<String>, now: DateTime<Utc>) {
        let mttr = (now - self.detected_at).num_milliseconds() as f64 / 1000.0;
        self.resolved_at = Some(now);
        self.resolution_action = Some(action.into());
        self.mttr_seconds = Some(mttr.max(0.0));
    }

    /// True iff this incident has not been resolved.
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn open_computes_mttd() {
        let first = Utc::now() - Duration::seconds(10);
        let now = Utc::now();
        let inc = Incident::open("x".into(), first, 3, Severity::Warning, now, 42);
        assert!((inc.mttd_seconds - 10.0).abs() < 1.0);
        assert!(inc.is_active());
    }

    #[test]
    fn mttd_clamps_to_zero_on_negative_skew() {
        let first = Utc::now() + Duration::seconds(5); // "future" first-failure: clock skew
        let now = Utc::now();
        let inc = Incident::open("x".into(), first, 3, Severity::Warning, now, 42);
        assert_eq!(inc.mttd_seconds, 0.0);
    }

    #[test]
    fn resolve_sets_mttr_and_clears_active() {
        let now = Utc::now();
        let mut inc = Incident::open("x".into(), now - Duration::seconds(5), 3, Severity::Warning, now, 42);
        let closed_at = now + Duration::seconds(20);
        inc.resolve("auto-recovery", closed_at);
        assert!(!inc.is_active());
        assert_eq!(inc.resolution_action.as_deref(), Some("auto-recovery"));
        assert!((inc.mttr_seconds.unwrap() - 20.0).abs() < 1.0);
    }
}
