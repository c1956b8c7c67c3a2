use async_trait::async_trait;
use monitor_common::ServiceName;

/// Callback invoked once, synchronously with the open, whenever the
/// detector opens a new incident. The Recovery Orchestrator implements
/// this in `monitor-recovery`; the detector only ever sees the trait, not
/// the orchestrator, so the two crates don't depend on each other (the
/// binary entry point wires the concrete implementation in).
#[async_trait]
pub trait RecoveryHook: Send + Sync {
    /// `service` just had a new incident opened with id `incident_id`.
    /// The hook must not block the detector indefinitely; long-running
    /// recovery work should be spawned off rather than awaited inline if
    /// it risks delaying subsequent detector evaluations.
    async fn on_incident_opened(&self, service: &ServiceName, incident_id: i64);
}

/// A hook that does nothing — used where recovery is disabled
/// (`AUTO_RECOVERY_ENABLED=false`) or in tests that don't exercise it.
pub struct NoopHook;

#[async_trait]
impl RecoveryHook for NoopHook {
    async fn on_incident_opened(&self, _service: &ServiceName, _incident_id: i64) {}
}
