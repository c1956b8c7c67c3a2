use crate::{schema, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monitor_common::{CheckStatus, HealthCheck, Incident, MonitorError, MonitorResult, Operation, OperationStatus, Severity, ServiceName};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Bounded retry budget for transient write failures (§7: "Retry up to
/// small bound; on exhaustion, drop the individual write and log ERROR").
const WRITE_RETRY_ATTEMPTS: u32 = 3;
const WRITE_RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// `rusqlite`-backed [`Store`] implementation, single connection guarded
/// by a coarse mutex (sanctioned by the concurrency model for a
/// single-writer-friendly store).
pub struct SqliteStore {
    conn: Arc<parking_lot::Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (creating if absent) the SQLite file at `path` and run schema
    /// migration. Pass `":memory:"` for an ephemeral in-process store.
    pub fn open(path: &str) -> MonitorResult<Self> {
        let conn = Connection::open(path).map_err(|e| MonitorError::Store(e.to_string()))?;
        schema::migrate(&conn).map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(parking_lot::Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on a blocking-pool thread, retrying
    /// up to [`WRITE_RETRY_ATTEMPTS`] times on transient SQLite errors.
    async fn with_retry<F, T>(&self, f: F) -> MonitorResult<T>
    where
        F: Fn(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut last_err = None;
            for attempt in 0..WRITE_RETRY_ATTEMPTS {
                let guard = conn.lock();
                match f(&guard) {
                    Ok(v) => return Ok(v),
                    Err(e) => {
                        last_err = Some(e);
                        drop(guard);
                        if attempt + 1 < WRITE_RETRY_ATTEMPTS {
                            thread::sleep(WRITE_RETRY_BACKOFF);
                        }
                    }
                }
            }
            let err = last_err.expect("loop runs at least once");
            tracing::error!("store write exhausted retries: {err}");
            Err(MonitorError::Store(err.to_string()))
        })
        .await
        .map_err(|e| MonitorError::Store(format!("store task panicked: {e}")))?
    }

    /// Run a read-only `f` against the connection on a blocking-pool
    /// thread. Reads are not retried — a failed read surfaces immediately.
    async fn read<F, T>(&self, f: F) -> MonitorResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard).map_err(|e| MonitorError::Store(e.to_string()))
        })
        .await
        .map_err(|e| MonitorError::Store(format!("store task panicked: {e}")))?
    }
}

fn status_to_str(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Up => "UP",
        CheckStatus::Down => "DOWN",
        CheckStatus::Timeout => "TIMEOUT",
        CheckStatus::Degraded => "DEGRADED",
        CheckStatus::Unhealthy => "UNHEALTHY",
    }
}

fn status_from_str(s: &str) -> CheckStatus {
    match s {
        "UP" => CheckStatus::Up,
        "DOWN" => CheckStatus::Down,
        "TIMEOUT" => CheckStatus::Timeout,
        "DEGRADED" => CheckStatus::Degraded,
        "UNHEALTHY" => CheckStatus::Unhealthy,
        other => panic!("unknown check status in store: {other}"),
    }
}

fn severity_to_str(s: Severity) -> &'static str {
    match s {
        Severity::Warning => "WARNING",
        Severity::Critical => "CRITICAL",
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "CRITICAL" => Severity::Critical,
        _ => Severity::Warning,
    }
}

fn row_to_check(row: &Row<'_>) -> rusqlite::Result<HealthCheck> {
    let status: String = row.get("status")?;
    let timestamp: String = row.get("timestamp")?;
    Ok(HealthCheck {
        id: row.get("id")?,
        service: ServiceName(row.get("service")?),
        request_id: row.get("request_id")?,
        status: status_from_str(&status),
        latency_ms: row.get("latency_ms")?,
        http_code: row.get::<_, Option<i64>>("http_code")?.map(|v| v as u16),
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .expect("timestamps are always written as rfc3339")
            .with_timezone(&Utc),
        is_timeout: row.get::<_, i64>("is_timeout")? != 0,
        error_message: row.get("error_message")?,
    })
}

fn row_to_incident(row: &Row<'_>) -> rusqlite::Result<Incident> {
    let severity: String = row.get("severity")?;
    let started_at: String = row.get("started_at")?;
    let detected_at: String = row.get("detected_at")?;
    let resolved_at: Option<String> = row.get("resolved_at")?;
    Ok(Incident {
        id: row.get("id")?,
        service: ServiceName(row.get("service")?),
        started_at: DateTime::parse_from_rfc3339(&started_at).unwrap().with_timezone(&Utc),
        detected_at: DateTime::parse_from_rfc3339(&detected_at).unwrap().with_timezone(&Utc),
        resolved_at: resolved_at.map(|s| DateTime::parse_from_rfc3339(&s).unwrap().with_timezone(&Utc)),
        severity: severity_from_str(&severity),
        consecutive_failures: row.get::<_, i64>("consecutive_failures")? as u32,
        resolution_action: row.get("resolution_action")?,
        mttd_seconds: row.get("mttd_seconds")?,
        mttr_seconds: row.get("mttr_seconds")?,
        anchor_check_id: row.get("anchor_check_id")?,
    })
}

fn operation_status_to_str(s: OperationStatus) -> &'static str {
    match s {
        OperationStatus::Pending => "PENDING",
        OperationStatus::Processing => "PROCESSING",
        OperationStatus::Processed => "PROCESSED",
        OperationStatus::Failed => "FAILED",
    }
}

fn operation_status_from_str(s: &str) -> OperationStatus {
    match s {
        "PROCESSING" => OperationStatus::Processing,
        "PROCESSED" => OperationStatus::Processed,
        "FAILED" => OperationStatus::Failed,
        _ => OperationStatus::Pending,
    }
}

fn row_to_operation(row: &Row<'_>) -> rusqlite::Result<Operation> {
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let payload: Option<String> = row.get("payload")?;
    Ok(Operation {
        id: row.get("id")?,
        op_type: row.get("type")?,
        payload: payload
            .map(|p| serde_json::from_str(&p).unwrap_or(serde_json::Value::Null))
            .unwrap_or(serde_json::Value::Null),
        status: operation_status_from_str(&status),
        error: row.get("error")?,
        created_at: DateTime::parse_from_rfc3339(&created_at).unwrap().with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at).unwrap().with_timezone(&Utc),
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn append_check(&self, check: HealthCheck) -> MonitorResult<i64> {
        self.with_retry(move |conn| {
            conn.execute(
                "INSERT INTO health_checks
                    (service, request_id, status, latency_ms, http_code, timestamp, is_timeout, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    check.service.as_str(),
                    check.request_id,
                    status_to_str(check.status),
                    check.latency_ms,
                    check.http_code.map(|c| c as i64),
                    check.timestamp.to_rfc3339(),
                    check.is_timeout as i64,
                    check.error_message,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn recent_checks(&self, service: &ServiceName, n: usize) -> MonitorResult<Vec<HealthCheck>> {
        let service = service.clone();
        self.read(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, service, request_id, status, latency_ms, http_code, timestamp, is_timeout, error_message
                 FROM health_checks WHERE service = ?1 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![service.as_str(), n as i64], row_to_check)?;
            rows.collect()
        })
        .await
    }

    async fn consecutive_failures(
        &self,
        service: &ServiceName,
        cap: u32,
    ) -> MonitorResult<(u32, Option<DateTime<Utc>>)> {
        let checks = self.recent_checks(service, cap as usize).await?;
        let mut count = 0u32;
        let mut oldest_failure_ts = None;
        for check in &checks {
            if !check.is_failure() {
                break;
            }
            count += 1;
            oldest_failure_ts = Some(check.timestamp);
        }
        Ok((count, oldest_failure_ts))
    }

    async fn open_incident(&self, incident: Incident) -> MonitorResult<i64> {
        self.with_retry(move |conn| {
            conn.execute(
                "INSERT INTO incidents
                    (service, started_at, detected_at, resolved_at, severity, consecutive_failures,
                     resolution_action, mttd_seconds, mttr_seconds, anchor_check_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    incident.service.as_str(),
                    incident.started_at.to_rfc3339(),
                    incident.detected_at.to_rfc3339(),
                    incident.resolved_at.map(|t| t.to_rfc3339()),
                    severity_to_str(incident.severity),
                    incident.consecutive_failures,
                    incident.resolution_action,
                    incident.mttd_seconds,
                    incident.mttr_seconds,
                    incident.anchor_check_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn update_incident(&self, incident: &Incident) -> MonitorResult<()> {
        let incident = incident.clone();
        self.with_retry(move |conn| {
            conn.execute(
                "UPDATE incidents SET resolved_at = ?1, resolution_action = ?2, mttr_seconds = ?3
                 WHERE id = ?4",
                params![
                    incident.resolved_at.map(|t| t.to_rfc3339()),
                    incident.resolution_action,
                    incident.mttr_seconds,
                    incident.id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn active_incident(&self, service: &ServiceName) -> MonitorResult<Option<Incident>> {
        let service = service.clone();
        self.read(move |conn| {
            conn.query_row(
                "SELECT id, service, started_at, detected_at, resolved_at, severity, consecutive_failures,
                        resolution_action, mttd_seconds, mttr_seconds, anchor_check_id
                 FROM incidents WHERE service = ?1 AND resolved_at IS NULL ORDER BY id DESC LIMIT 1",
                params![service.as_str()],
                row_to_incident,
            )
            .optional()
        })
        .await
    }

    async fn incidents(&self, service: Option<&ServiceName>, limit: usize) -> MonitorResult<Vec<Incident>> {
        let service = service.cloned();
        self.read(move |conn| match &service {
            Some(service) => {
                let mut stmt = conn.prepare(
                    "SELECT id, service, started_at, detected_at, resolved_at, severity, consecutive_failures,
                            resolution_action, mttd_seconds, mttr_seconds, anchor_check_id
                     FROM incidents WHERE service = ?1 ORDER BY id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![service.as_str(), limit as i64], row_to_incident)?;
                rows.collect()
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, service, started_at, detected_at, resolved_at, severity, consecutive_failures,
                            resolution_action, mttd_seconds, mttr_seconds, anchor_check_id
                     FROM incidents ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit as i64], row_to_incident)?;
                rows.collect()
            }
        })
        .await
    }

    async fn get_operation(&self, id: &str) -> MonitorResult<Option<Operation>> {
        let id = id.to_string();
        self.read(move |conn| {
            conn.query_row(
                "SELECT id, type, payload, status, error, created_at, updated_at
                 FROM operations WHERE id = ?1",
                params![id],
                row_to_operation,
            )
            .optional()
        })
        .await
    }

    async fn save_operation(&self, operation: &Operation) -> MonitorResult<()> {
        let operation = operation.clone();
        self.with_retry(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO operations (id, type, payload, status, error, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    operation.id,
                    operation.op_type,
                    serde_json::to_string(&operation.payload).unwrap_or_default(),
                    operation_status_to_str(operation.status),
                    operation.error,
                    operation.created_at.to_rfc3339(),
                    operation.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_common::Operation;

    fn store() -> SqliteStore {
        SqliteStore::open(":memory:").unwrap()
    }

    #[tokio::test]
    async fn append_and_recent_roundtrip() {
        let store = store();
        let check = HealthCheck::up(ServiceName::from("reserves"), "req-1", 12.5, 200);
        let id = store.append_check(check.clone()).await.unwrap();
        assert!(id > 0);

        let recent = store.recent_checks(&ServiceName::from("reserves"), 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].service, check.service);
        assert_eq!(recent[0].request_id, check.request_id);
        assert_eq!(recent[0].status, check.status);
        assert_eq!(recent[0].latency_ms, check.latency_ms);
        assert_eq!(recent[0].http_code, check.http_code);
        assert_eq!(recent[0].is_timeout, check.is_timeout);
    }

    #[tokio::test]
    async fn recent_checks_are_newest_first() {
        let store = store();
        let svc = ServiceName::from("reserves");
        for i in 0..5 {
            store
                .append_check(HealthCheck::up(svc.clone(), format!("req-{i}"), 1.0, 200))
                .await
                .unwrap();
        }
        let recent = store.recent_checks(&svc, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
    }

    #[tokio::test]
    async fn consecutive_failures_stops_at_first_non_failure_newest_first() {
        let store = store();
        let svc = ServiceName::from("reserves");
        store.append_check(HealthCheck::down(svc.clone(), "r1", 1.0, "x")).await.unwrap();
        store.append_check(HealthCheck::up(svc.clone(), "r2", 1.0, 200)).await.unwrap();
        store.append_check(HealthCheck::down(svc.clone(), "r3", 1.0, "x")).await.unwrap();
        store.append_check(HealthCheck::down(svc.clone(), "r4", 1.0, "x")).await.unwrap();

        // newest-first: r4(DOWN), r3(DOWN), r2(UP) -> breaks streak at 2
        let (count, _ts) = store.consecutive_failures(&svc, 10).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn consecutive_failures_respects_cap() {
        let store = store();
        let svc = ServiceName::from("reserves");
        for i in 0..5 {
            store
                .append_check(HealthCheck::down(svc.clone(), format!("r{i}"), 1.0, "x"))
                .await
                .unwrap();
        }
        let (count, _) = store.consecutive_failures(&svc, 3).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn open_incident_then_active_incident_returns_it() {
        let store = store();
        let svc = ServiceName::from("reserves");
        let now = Utc::now();
        let incident = Incident::open(svc.clone(), now, 3, Severity::Warning, now, 1);
        let id = store.open_incident(incident).await.unwrap();
        assert!(id > 0);

        let active = store.active_incident(&svc).await.unwrap();
        assert!(active.is_some());
        assert_eq!(active.unwrap().id, id);
    }

    #[tokio::test]
    async fn resolving_incident_clears_active_incident() {
        let store = store();
        let svc = ServiceName::from("reserves");
        let now = Utc::now();
        let mut incident = Incident::open(svc.clone(), now, 3, Severity::Warning, now, 1);
        let id = store.open_incident(incident.clone()).await.unwrap();
        incident.id = id;

        incident.resolve("auto-recovery", Utc::now());
        store.update_incident(&incident).await.unwrap();

        assert!(store.active_incident(&svc).await.unwrap().is_none());
        let all = store.incidents(Some(&svc), 10).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_active());
    }

    #[tokio::test]
    async fn operation_roundtrip() {
        let store = store();
        let now = Utc::now();
        let op = Operation {
            id: "op-1".into(),
            op_type: "reserve".into(),
            payload: serde_json::json!({"total": 10}),
            status: OperationStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        };
        store.save_operation(&op).await.unwrap();
        let fetched = store.get_operation("op-1").await.unwrap().unwrap();
        assert_eq!(fetched.op_type, "reserve");
        assert_eq!(fetched.status, OperationStatus::Pending);
        assert_eq!(fetched.payload, serde_json::json!({"total": 10}));
    }

    #[tokio::test]
    async fn unknown_operation_is_none() {
        let store = store();
        assert!(store.get_operation("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn schema_migration_is_idempotent_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.sqlite3");
        let path = path.to_str().unwrap();

        let first = SqliteStore::open(path).unwrap();
        let svc = ServiceName::from("reserves");
        first.append_check(HealthCheck::up(svc.clone(), "r1", 1.0, 200)).await.unwrap();
        drop(first);

        // Reopening an existing file re-runs `CREATE TABLE IF NOT EXISTS`
        // and must neither fail nor lose the prior write (§4.A: "idempotently
        // creatable, safe on every boot").
        let second = SqliteStore::open(path).unwrap();
        let recent = second.recent_checks(&svc, 10).await.unwrap();
        assert_eq!(recent.len(), 1);

        second.append_check(HealthCheck::down(svc.clone(), "r2", 1.0, "x")).await.unwrap();
        let recent = second.recent_checks(&svc, 10).await.unwrap();
        assert_eq!(recent.len(), 2);
    }
}
