//! Probe Engine (§4.B): turns [`ProbeTransport`] outcomes into
//! [`HealthCheck`]s, probing concurrently across services.

use crate::transport::{ProbeOutcome, ProbeTransport};
use monitor_common::{HealthCheck, MonitorError, MonitorResult, ServiceCatalog, ServiceName};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Probes services via a pluggable [`ProbeTransport`] and assembles
/// [`HealthCheck`] records. Holds no state of its own — every call is
/// self-contained, so the same engine instance is shared (via `Arc`)
/// between the Scheduler's direct work-peer probe and the broker
/// fan-out consumer.
pub struct ProbeEngine {
    transport: Arc<dyn ProbeTransport>,
    timeout: Duration,
}

impl ProbeEngine {
    /// Build an engine with a hard per-probe deadline of `timeout`.
    pub fn new(transport: Arc<dyn ProbeTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Probe a single registered `service` and turn the outcome into a
    /// not-yet-persisted [`HealthCheck`]. Fails only if `service` is not
    /// in `catalog` — a configuration error, not a probe observation.
    pub async fn probe(
        &self,
        catalog: &ServiceCatalog,
        service: &ServiceName,
        request_id: &str,
    ) -> MonitorResult<HealthCheck> {
        let endpoint = catalog
            .endpoint(service)
            .ok_or_else(|| MonitorError::UnknownService(service.to_string()))?;
        let outcome = self.transport.probe(endpoint, self.timeout).await;
        Ok(outcome_to_check(service.clone(), request_id, outcome))
    }

    /// Probe every service in `services` concurrently (§5: "fan-out
    /// probes must proceed in parallel, not serially"), returning one
    /// check per service that was actually in the catalog.
    pub async fn probe_many(
        &self,
        catalog: &ServiceCatalog,
        services: &[ServiceName],
        request_id: &str,
    ) -> Vec<HealthCheck> {
        let futures = services.iter().filter_map(|service| {
            catalog.endpoint(service).map(|endpoint| {
                let transport = self.transport.clone();
                let timeout = self.timeout;
                let service = service.clone();
                let endpoint = endpoint.to_string();
                let request_id = request_id.to_string();
                async move {
                    let outcome = transport.probe(&endpoint, timeout).await;
                    outcome_to_check(service, &request_id, outcome)
                }
            })
        });
        futures::future::join_all(futures).await
    }
}

/// Turn a pre-classified [`ProbeOutcome`] (e.g. from a non-HTTP health
/// signal such as the broker's own self-check) into a [`HealthCheck`].
/// Exposed so callers outside this crate can reuse the same check-shaping
/// logic instead of constructing `HealthCheck` fields by hand.
pub fn outcome_to_health_check(service: ServiceName, request_id: &str, outcome: ProbeOutcome) -> HealthCheck {
    outcome_to_check(service, request_id, outcome)
}

fn outcome_to_check(service: ServiceName, request_id: &str, outcome: ProbeOutcome) -> HealthCheck {
    HealthCheck {
        id: 0,
        service,
        request_id: request_id.to_string(),
        status: outcome.status,
        latency_ms: Some(outcome.latency_ms),
        http_code: outcome.http_code,
        timestamp: chrono::Utc::now(),
        is_timeout: outcome.status == monitor_common::CheckStatus::Timeout,
        error_message: outcome.error_message,
    }
}

/// Turns a batch of per-service outcomes keyed by name (e.g. from a
/// broker-side fan-out consumer that already ran the probes) into
/// [`HealthCheck`]s, without needing a [`ServiceCatalog`] lookup. Exists
/// so the Echo-handling path (which receives results over the wire, not
/// from a local transport call) can reuse the same check-shaping logic.
pub fn outcomes_to_checks(
    request_id: &str,
    outcomes: HashMap<ServiceName, ProbeOutcome>,
) -> Vec<HealthCheck> {
    outcomes
        .into_iter()
        .map(|(service, outcome)| outcome_to_check(service, request_id, outcome))
        .collect()
}
