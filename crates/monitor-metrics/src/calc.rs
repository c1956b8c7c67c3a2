//! Pure aggregation functions, one per original `calculate_*` helper in
//! `app/monitor/metrics.py`. Kept free of I/O so they're trivial to unit
//! test against hand-built incident/check lists.

use crate::types::{Availability, HealthCheckStats, Stat};
use chrono::{DateTime, Utc};
use monitor_common::{HealthCheck, Incident};

/// Bounded sample size for health-check statistics (§4.E: "a bounded
/// recent sample, e.g. 500").
pub const RECENT_CHECKS_SAMPLE: usize = 500;
/// Per-service incident query bound, mirroring the original's `limit=100`.
pub const SERVICE_INCIDENTS_LIMIT: usize = 100;
/// Fleet-wide incident query bound, mirroring the original's `limit=200`.
pub const GLOBAL_INCIDENTS_LIMIT: usize = 200;

/// Mean/min/max of every incident's `mttd_seconds` (all incidents, not
/// just resolved ones — MTTD is defined at detection, before resolution).
pub fn calculate_mttd(incidents: &[Incident]) -> Stat {
    mean_min_max(incidents.iter().map(|i| i.mttd_seconds))
}

/// Mean/min/max of `mttr_seconds` across resolved incidents.
pub fn calculate_mttr(incidents: &[Incident]) -> Stat {
    mean_min_max(incidents.iter().filter_map(|i| i.mttr_seconds))
}

fn mean_min_max(values: impl Iterator<Item = f64>) -> Stat {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return Stat::default();
    }
    let sum: f64 = values.iter().sum();
    let avg = sum / values.len() as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Stat {
        avg_seconds: Some(avg),
        min_seconds: Some(min),
        max_seconds: Some(max),
    }
}

/// Mean time between failures: average of the positive gaps between each
/// resolved incident's close and the next resolved incident's start,
/// ordered by `started_at`. `None` with fewer than two resolved incidents
/// or if every gap is non-positive (overlapping/out-of-order incidents).
pub fn calculate_mtbf(resolved_incidents: &[Incident]) -> Option<f64> {
    let mut sorted: Vec<&Incident> = resolved_incidents.iter().filter(|i| i.resolved_at.is_some()).collect();
    sorted.sort_by_key(|i| i.started_at);

    if sorted.len() < 2 {
        return None;
    }

    let mut gaps = Vec::new();
    for window in sorted.windows(2) {
        let prev_resolved = window[0].resolved_at.expect("filtered to resolved above");
        let curr_started = window[1].started_at;
        let diff = (curr_started - prev_resolved).num_milliseconds() as f64 / 1000.0;
        if diff > 0.0 {
            gaps.push(diff);
        }
    }

    if gaps.is_empty() {
        None
    } else {
        Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
    }
}

/// Availability and downtime over the trailing `window_hours`, clamped to
/// the window's duration. `None` for both fields when `window_hours == 0`
/// (§8 boundary case — would otherwise divide by zero).
pub fn calculate_availability(incidents: &[Incident], window_hours: f64, now: DateTime<Utc>) -> Availability {
    if window_hours <= 0.0 {
        return Availability {
            percent: None,
            total_downtime_seconds: None,
        };
    }

    let total_seconds = window_hours * 3600.0;
    let window_start = now - chrono::Duration::milliseconds((total_seconds * 1000.0) as i64);

    let mut total_downtime = 0.0;
    for incident in incidents {
        let mut started = incident.started_at;
        let resolved = incident.resolved_at;

        if started < window_start {
            if let Some(resolved_at) = resolved {
                if resolved_at < window_start {
                    continue; // entirely before the window
                }
            }
            started = window_start;
        }

        let end = resolved.unwrap_or(now);
        let downtime = (end - started).num_milliseconds() as f64 / 1000.0;
        if downtime > 0.0 {
            total_downtime += downtime;
        }
    }

    total_downtime = total_downtime.min(total_seconds);
    let availability = (total_seconds - total_downtime) / total_seconds * 100.0;

    Availability {
        percent: Some(availability),
        total_downtime_seconds: Some(total_downtime),
    }
}

/// Totals and average latency over a health-check sample.
pub fn calculate_health_check_stats(checks: &[HealthCheck]) -> HealthCheckStats {
    let total = checks.len();
    let successful = checks.iter().filter(|c| !c.is_failure()).count();
    let failed = total - successful;

    let latencies: Vec<f64> = checks.iter().filter_map(|c| c.latency_ms).collect();
    let avg_latency_ms = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    };

    let success_rate_percent = if total > 0 {
        successful as f64 / total as f64 * 100.0
    } else {
        100.0
    };

    HealthCheckStats {
        total,
        successful,
        failed,
        success_rate_percent,
        avg_latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use monitor_common::Severity;

    fn incident_at(started_offset_min: i64, resolved_offset_min: Option<i64>, now: DateTime<Utc>) -> Incident {
        let started = now - Duration::minutes(started_offset_min);
        let mut inc = Incident::open(
            "svc".into(),
            started,
            3,
            Severity::Warning,
            started + Duration::seconds(10),
            1,
        );
        if let Some(offset) = resolved_offset_min {
            inc.resolve("auto-recovery", now - Duration::minutes(offset));
        }
        inc
    }

    #[test]
    fn mttd_empty_is_none() {
        let stat = calculate_mttd(&[]);
        assert!(stat.avg_seconds.is_none());
    }

    #[test]
    fn mttr_only_considers_resolved() {
        let now = Utc::now();
        let incidents = vec![incident_at(30, Some(20), now), incident_at(10, None, now)];
        let stat = calculate_mttr(&incidents);
        assert!(stat.avg_seconds.is_some());
    }

    #[test]
    fn mtbf_needs_two_resolved_incidents() {
        let now = Utc::now();
        let single = vec![incident_at(30, Some(20), now)];
        assert_eq!(calculate_mtbf(&single), None);
    }

    #[test]
    fn mtbf_averages_positive_gaps() {
        let now = Utc::now();
        let incidents = vec![incident_at(60, Some(50), now), incident_at(30, Some(20), now)];
        let mtbf = calculate_mtbf(&incidents).unwrap();
        assert!(mtbf > 0.0);
    }

    #[test]
    fn availability_window_zero_is_none() {
        let now = Utc::now();
        let availability = calculate_availability(&[], 0.0, now);
        assert!(availability.percent.is_none());
        assert!(availability.total_downtime_seconds.is_none());
    }

    #[test]
    fn availability_no_incidents_is_100_percent() {
        let now = Utc::now();
        let availability = calculate_availability(&[], 24.0, now);
        assert_eq!(availability.percent, Some(100.0));
    }

    #[test]
    fn availability_clamps_downtime_to_window() {
        let now = Utc::now();
        let incidents = vec![incident_at(1000, None, now)]; // started way before a 1h window
        let availability = calculate_availability(&incidents, 1.0, now);
        assert!((availability.total_downtime_seconds.unwrap() - 3600.0).abs() < 1.0);
        assert!(availability.percent.unwrap() >= 0.0);
    }

    #[test]
    fn health_check_stats_empty_sample_is_fully_healthy() {
        let stats = calculate_health_check_stats(&[]);
        assert_eq!(stats.success_rate_percent, 100.0);
        assert_eq!(stats.total, 0);
    }

    #[test]
    fn health_check_stats_counts_failures() {
        let checks = vec![
            HealthCheck::up("svc".into(), "r1", 10.0, 200),
            HealthCheck::down("svc".into(), "r2", 5.0, "boom"),
        ];
        let stats = calculate_health_check_stats(&checks);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate_percent, 50.0);
        assert_eq!(stats.avg_latency_ms, Some(7.5));
    }
}
