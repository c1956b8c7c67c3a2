//! Live scheduler status, exposed read-only via `GET /status` (§6).

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Point-in-time snapshot returned to API callers.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Whether the scheduler loop is currently running.
    pub running: bool,
    /// Configured tick interval.
    pub ping_interval_seconds: f64,
    /// Number of direct work-peer probes sent so far.
    pub ping_count: u64,
    /// Number of Echo batches processed so far.
    pub echo_count: u64,
    /// Timestamp of the most recent tick, if any.
    pub last_ping_time: Option<DateTime<Utc>>,
    /// Timestamp of the most recently processed Echo, if any.
    pub last_echo_time: Option<DateTime<Utc>>,
}

/// Shared, lock-cheap counters and timestamps updated by the Scheduler and
/// read by the Read API. Never the source of truth for anything the
/// Detector or Metrics Engine reasons about — purely observability.
pub struct SchedulerStatus {
    running: AtomicBool,
    ping_count: AtomicU64,
    echo_count: AtomicU64,
    last_ping_time: RwLock<Option<DateTime<Utc>>>,
    last_echo_time: RwLock<Option<DateTime<Utc>>>,
    ping_interval: Duration,
}

impl SchedulerStatus {
    pub(crate) fn new(ping_interval: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            ping_count: AtomicU64::new(0),
            echo_count: AtomicU64::new(0),
            last_ping_time: RwLock::new(None),
            last_echo_time: RwLock::new(None),
            ping_interval,
        }
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn record_ping(&self, at: DateTime<Utc>) {
        self.ping_count.fetch_add(1, Ordering::SeqCst);
        *self.last_ping_time.write() = Some(at);
    }

    pub(crate) fn record_echo(&self, at: DateTime<Utc>) {
        self.echo_count.fetch_add(1, Ordering::SeqCst);
        *self.last_echo_time.write() = Some(at);
    }

    /// True iff the scheduler loop's cooperative stop flag has not been
    /// set since the last start.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot the current counters for `GET /status`.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            running: self.is_running(),
            ping_interval_seconds: self.ping_interval.as_secs_f64(),
            ping_count: self.ping_count.load(Ordering::SeqCst),
            echo_count: self.echo_count.load(Ordering::SeqCst),
            last_ping_time: *self.last_ping_time.read(),
            last_echo_time: *self.last_echo_time.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_status_is_not_running_with_zero_counters() {
        let status = SchedulerStatus::new(Duration::from_secs(5));
        let snapshot = status.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.ping_count, 0);
        assert_eq!(snapshot.echo_count, 0);
        assert!(snapshot.last_ping_time.is_none());
        assert!(snapshot.last_echo_time.is_none());
        assert_eq!(snapshot.ping_interval_seconds, 5.0);
    }

    #[test]
    fn record_ping_and_echo_advance_independent_counters() {
        let status = SchedulerStatus::new(Duration::from_secs(5));
        let t1 = Utc::now();
        status.record_ping(t1);
        status.record_ping(t1);
        status.record_echo(t1);

        let snapshot = status.snapshot();
        assert_eq!(snapshot.ping_count, 2);
        assert_eq!(snapshot.echo_count, 1);
        assert_eq!(snapshot.last_ping_time, Some(t1));
        assert_eq!(snapshot.last_echo_time, Some(t1));
    }

    #[test]
    fn set_running_is_reflected_in_is_running_and_snapshot() {
        let status = SchedulerStatus::new(Duration::from_secs(5));
        status.set_running(true);
        assert!(status.is_running());
        assert!(status.snapshot().running);
        status.set_running(false);
        assert!(!status.is_running());
    }
}
