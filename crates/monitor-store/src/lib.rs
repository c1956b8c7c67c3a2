//! Single-writer-friendly persistent store for health checks, incidents,
//! and the `operations` schema bound (§4.A / §6).
//!
//! Backed by `rusqlite` (bundled SQLite) behind a coarse `Mutex`, which the
//! concurrency model explicitly sanctions ("row-level or coarse lock
//! acceptable"). All access goes through the [`Store`] trait so the
//! Detector, Recovery Orchestrator, Metrics Engine, and Read API depend on
//! behavior rather than SQL.

mod schema;
mod sqlite_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_common::{HealthCheck, Incident, MonitorResult, Operation, ServiceName};

pub use sqlite_store::SqliteStore;

/// Durable log of health checks and incidents, plus the `operations`
/// schema bound.
///
/// All methods are `async` so callers (the Scheduler, broker-consumer
/// workers, Read API handlers) never block their executor thread on SQLite
/// I/O; `SqliteStore` internally runs the blocking call via
/// `tokio::task::spawn_blocking`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically assign a monotonic id, persist `check`, and return the id.
    async fn append_check(&self, check: HealthCheck) -> MonitorResult<i64>;

    /// The last `n` checks for `service`, newest (`id DESC`) first.
    async fn recent_checks(&self, service: &ServiceName, n: usize) -> MonitorResult<Vec<HealthCheck>>;

    /// Walk `service`'s checks newest-first, counting while `is_failure()`
    /// holds, stopping at the first non-failure or at `cap`. Returns the
    /// count and the timestamp of the *oldest* check in the counted
    /// streak (`None` if the streak is empty).
    async fn consecutive_failures(
        &self,
        service: &ServiceName,
        cap: u32,
    ) -> MonitorResult<(u32, Option<DateTime<Utc>>)>;

    /// Open a new incident, assigning it an id.
    async fn open_incident(&self, incident: Incident) -> MonitorResult<i64>;

    /// Persist changes to an already-open incident (e.g. on resolution).
    async fn update_incident(&self, incident: &Incident) -> MonitorResult<()>;

    /// The open incident for `service` (`resolved_at IS NULL`), if any.
    async fn active_incident(&self, service: &ServiceName) -> MonitorResult<Option<Incident>>;

    /// Incidents for `service` (or all services if `None`), newest first,
    /// bounded by `limit`.
    async fn incidents(&self, service: Option<&ServiceName>, limit: usize) -> MonitorResult<Vec<Incident>>;

    /// Fetch a business operation by id (read-only accessor; no write
    /// path exists in this crate — see §6 supplement).
    async fn get_operation(&self, id: &str) -> MonitorResult<Option<Operation>>;

    /// Insert or replace a business operation record. Exists so the
    /// `operations` table's read accessor has something to round-trip in
    /// tests; this crate performs no operation processing of its own.
    async fn save_operation(&self, operation: &Operation) -> MonitorResult<()>;
}
