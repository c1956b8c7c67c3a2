//! Idempotent schema creation — safe to run on every boot.
//!
//! Layout mirrors §6 of the spec: `operations`, `health_checks`, and
//! `incidents`. The `(service, id DESC)` index on `health_checks` is the
//! one that matters — `id` is monotone in probe send order, so it alone
//! makes `recent_checks`/`consecutive_failures` lookups O(log N) without
//! needing a secondary timestamp index.

use rusqlite::Connection;

pub(crate) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS operations (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            payload TEXT,
            status TEXT NOT NULL,
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS health_checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service TEXT NOT NULL,
            request_id TEXT NOT NULL,
            status TEXT NOT NULL,
            latency_ms REAL,
            http_code INTEGER,
            timestamp TEXT NOT NULL,
            is_timeout INTEGER NOT NULL,
            error_message TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_health_checks_service_id
            ON health_checks(service, id DESC);

        CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service TEXT NOT NULL,
            started_at TEXT NOT NULL,
            detected_at TEXT NOT NULL,
            resolved_at TEXT,
            severity TEXT NOT NULL,
            consecutive_failures INTEGER NOT NULL,
            resolution_action TEXT,
            mttd_seconds REAL NOT NULL,
            mttr_seconds REAL,
            anchor_check_id INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_incidents_service_open
            ON incidents(service, resolved_at);
        CREATE INDEX IF NOT EXISTS idx_incidents_service_id
            ON incidents(service, id DESC);
        "#,
    )
}
