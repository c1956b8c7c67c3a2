//! Recovery Orchestrator (§4.D): protection-gated, once-per-incident
//! container restart. Grounded in `recovery.py`'s `restart_service`/
//! `recover_service` pair — `SERVICE_TO_CONTAINER` and `DO_NOT_RESTART`
//! become the catalog's container map and protection set.

mod action;

pub use action::{DockerCliRestartAction, RestartAction, RestartOutcome};

use async_trait::async_trait;
use dashmap::DashSet;
use monitor_common::{MonitorConfig, ServiceCatalog, ServiceName};
use monitor_detector::RecoveryHook;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Outcome of a [`RecoveryOrchestrator::recover`] call.
#[derive(Debug, Clone)]
pub struct RecoveryResult {
    /// Whether the restart action succeeded. `false` for "unknown
    /// service", "protected", and every [`RestartOutcome::success`] == false case.
    pub success: bool,
    /// `"protected"`, `"unknown service"`, or the restart action's error.
    pub error: Option<String>,
}

/// Executes restart actions, gated by the catalog's protection set and
/// de-duplicated per service via a try-lock exclusion set. Implements
/// [`RecoveryHook`] so the Detector can invoke it without depending on
/// this crate.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    catalog: Arc<ServiceCatalog>,
    action: Arc<dyn RestartAction>,
    in_flight: Arc<DashSet<ServiceName>>,
    enabled: bool,
    timeout: Duration,
}

impl RecoveryOrchestrator {
    /// Build an orchestrator reading the policy flag and timeout from
    /// `config`.
    pub fn new(catalog: Arc<ServiceCatalog>, action: Arc<dyn RestartAction>, config: &MonitorConfig) -> Self {
        Self {
            catalog,
            action,
            in_flight: Arc::new(DashSet::new()),
            enabled: config.auto_recovery_enabled,
            timeout: config.recovery_timeout,
        }
    }

    /// Attempt to recover `service` for `incident_id`. Never mutates any
    /// incident — resolution is decided solely by the Detector once it
    /// observes fresh UPs (§4.D).
    pub async fn recover(&self, service: &ServiceName, incident_id: i64) -> RecoveryResult {
        if !self.enabled {
            return RecoveryResult {
                success: false,
                error: Some("auto-recovery disabled".to_string()),
            };
        }

        if self.catalog.is_protected(service) {
            warn!(%service, incident_id, "recovery skipped: service is protected from automatic restart");
            return RecoveryResult {
                success: false,
                error: Some("protected".to_string()),
            };
        }

        let Some(container) = self.catalog.container(service) else {
            return RecoveryResult {
                success: false,
                error: Some("unknown service".to_string()),
            };
        };

        if !self.in_flight.insert(service.clone()) {
            // A concurrent trigger for this service is already running.
            // The Detector only calls this once per incident open, so
            // this is defense in depth, not expected in normal operation.
            return RecoveryResult {
                success: false,
                error: Some("recovery already in flight".to_string()),
            };
        }

        warn!(%service, incident_id, "recovery triggered");
        let container = container.to_string();
        let outcome = self.action.restart(&container, self.timeout).await;
        self.in_flight.remove(service);

        if outcome.success {
            info!(%service, incident_id, container = %outcome.container, "recovery action completed");
            RecoveryResult {
                success: true,
                error: None,
            }
        } else {
            error!(%service, incident_id, error = ?outcome.error, "recovery action failed");
            RecoveryResult {
                success: false,
                error: outcome.error,
            }
        }
    }
}

#[async_trait]
impl RecoveryHook for RecoveryOrchestrator {
    async fn on_incident_opened(&self, service: &ServiceName, incident_id: i64) {
        // Spawned so a slow/hung restart (bounded by `timeout`, default
        // 30s) never delays the Detector's per-service lock for the next
        // tick's evaluation.
        let this = self.clone();
        let service = service.clone();
        tokio::spawn(async move {
            this.recover(&service, incident_id).await;
        });
    }
}
