//! Incident Detector (§4.C): a per-service consecutive-failure state
//! machine, invoked after every batch of new checks is written.

mod hook;

pub use hook::{NoopHook, RecoveryHook};

use chrono::Utc;
use dashmap::DashMap;
use monitor_common::{Incident, MonitorConfig, MonitorResult, Severity};
use monitor_common::ServiceName;
use monitor_store::Store;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Runs the open/hold/close state machine for one or many services
/// against a [`Store`], invoking a [`RecoveryHook`] once per incident
/// open. Per-service evaluation is serialized (a keyed async mutex) so
/// concurrent ticks for the *same* service can't race on open/close, while
/// different services evaluate in parallel.
pub struct IncidentDetector {
    store: Arc<dyn Store>,
    hook: Arc<dyn RecoveryHook>,
    n_fail: u32,
    n_ok: u32,
    locks: DashMap<ServiceName, Arc<AsyncMutex<()>>>,
}

impl IncidentDetector {
    /// Build a detector reading thresholds from `config`.
    pub fn new(store: Arc<dyn Store>, hook: Arc<dyn RecoveryHook>, config: &MonitorConfig) -> Self {
        Self {
            store,
            hook,
            n_fail: config.n_fail,
            n_ok: config.n_ok,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, service: &ServiceName) -> Arc<AsyncMutex<()>> {
        self.locks
            .entry(service.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Evaluate `service`'s current state against the new checks already
    /// written to the store, opening, holding, or closing an incident.
    /// Returns the incident id if one was newly opened this call (so the
    /// caller — typically the Scheduler or Echo handler — knows whether
    /// a recovery hook fired synchronously, without re-deriving it).
    pub async fn evaluate(&self, service: &ServiceName) -> MonitorResult<Option<i64>> {
        let guard = self.lock_for(service);
        let _permit = guard.lock().await;

        let cap = (2 * self.n_fail).max(self.n_ok);
        let (k, first_ts) = self.store.consecutive_failures(service, cap).await?;
        let active = self.store.active_incident(service).await?;

        if k >= self.n_fail {
            if active.is_none() {
                let first_ts = first_ts.expect("k >= n_fail implies at least one counted failure");
                let now = Utc::now();
                let severity = if k >= 2 * self.n_fail {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                let anchor_check_id = self.newest_check_id(service).await?;
                let incident = Incident::open(service.clone(), first_ts, k, severity, now, anchor_check_id);
                let id = self.store.open_incident(incident).await?;
                self.hook.on_incident_opened(service, id).await;
                return Ok(Some(id));
            }
            // Holding: k >= n_fail and an incident is already open — no change.
            return Ok(None);
        }

        // k < n_fail: closing path, or already healthy.
        if let Some(mut incident) = active {
            if self.confirmed_recovered(service, incident.anchor_check_id).await? {
                incident.resolve("auto-recovery", Utc::now());
                self.store.update_incident(&incident).await?;
            }
        }
        Ok(None)
    }

    /// The id of the most recent check recorded for `service`, used as the
    /// new incident's N_ok floor. `0` if no checks exist yet (can't
    /// happen in practice — an incident can't open without failures
    /// already written — but kept total rather than panicking).
    async fn newest_check_id(&self, service: &ServiceName) -> MonitorResult<i64> {
        let recent = self.store.recent_checks(service, 1).await?;
        Ok(recent.first().map(|c| c.id).unwrap_or(0))
    }

    /// True iff the newest `n_ok` checks for `service` are all non-failure
    /// and all postdate `anchor_check_id` (§9: N_ok confirmation must be
    /// strictly after the incident's detection point).
    async fn confirmed_recovered(&self, service: &ServiceName, anchor_check_id: i64) -> MonitorResult<bool> {
        let recent = self.store.recent_checks(service, self.n_ok as usize).await?;
        if recent.len() < self.n_ok as usize {
            return Ok(false);
        }
        Ok(recent
            .iter()
            .all(|check| check.id > anchor_check_id && !check.is_failure()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_common::{HealthCheck, MonitorConfig};
    use monitor_store::SqliteStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook(AtomicUsize);

    #[async_trait::async_trait]
    impl RecoveryHook for CountingHook {
        async fn on_incident_opened(&self, _service: &ServiceName, _incident_id: i64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config() -> MonitorConfig {
        let mut cfg = MonitorConfig::default();
        cfg.n_fail = 3;
        cfg.n_ok = 3;
        cfg
    }

    #[tokio::test]
    async fn three_downs_open_a_warning_incident() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let detector = IncidentDetector::new(store.clone(), hook.clone(), &config());
        let svc = ServiceName::from("reserves");

        for _ in 0..3 {
            push_down(&store, &svc).await;
        }
        let opened = detector.evaluate(&svc).await.unwrap();
        assert!(opened.is_some());
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);

        let incident = store.active_incident(&svc).await.unwrap().unwrap();
        assert_eq!(incident.severity, monitor_common::Severity::Warning);
    }

    #[tokio::test]
    async fn six_downs_open_a_critical_incident() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let detector = IncidentDetector::new(store.clone(), hook, &config());
        let svc = ServiceName::from("reserves");

        for _ in 0..6 {
            push_down(&store, &svc).await;
        }
        detector.evaluate(&svc).await.unwrap();
        let incident = store.active_incident(&svc).await.unwrap().unwrap();
        assert_eq!(incident.severity, monitor_common::Severity::Critical);
    }

    #[tokio::test]
    async fn holding_does_not_retrigger_recovery() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let detector = IncidentDetector::new(store.clone(), hook.clone(), &config());
        let svc = ServiceName::from("reserves");

        for _ in 0..3 {
            push_down(&store, &svc).await;
        }
        detector.evaluate(&svc).await.unwrap();
        push_down(&store, &svc).await;
        detector.evaluate(&svc).await.unwrap();
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn three_ups_after_opening_closes_the_incident() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let detector = IncidentDetector::new(store.clone(), hook, &config());
        let svc = ServiceName::from("reserves");

        for _ in 0..3 {
            push_down(&store, &svc).await;
        }
        detector.evaluate(&svc).await.unwrap();

        for _ in 0..3 {
            push_up(&store, &svc).await;
        }
        detector.evaluate(&svc).await.unwrap();

        assert!(store.active_incident(&svc).await.unwrap().is_none());
        let incidents = store.incidents(Some(&svc), 10).await.unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].resolution_action.as_deref(), Some("auto-recovery"));
    }

    #[tokio::test]
    async fn single_up_amid_downs_does_not_close_without_full_n_ok() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let hook = Arc::new(CountingHook(AtomicUsize::new(0)));
        let detector = IncidentDetector::new(store.clone(), hook, &config());
        let svc = ServiceName::from("reserves");

        for _ in 0..3 {
            push_down(&store, &svc).await;
        }
        detector.evaluate(&svc).await.unwrap();

        push_up(&store, &svc).await;
        detector.evaluate(&svc).await.unwrap();

        assert!(store.active_incident(&svc).await.unwrap().is_some());
    }

    async fn push_down(store: &Arc<dyn Store>, service: &ServiceName) {
        store
            .append_check(HealthCheck::down(service.clone(), "r", 1.0, "boom"))
            .await
            .unwrap();
    }

    async fn push_up(store: &Arc<dyn Store>, service: &ServiceName) {
        store
            .append_check(HealthCheck::up(service.clone(), "r", 1.0, 200))
            .await
            .unwrap();
    }
}
