//! Hybrid probe engine (§4.B): classifies each probe attempt into a
//! [`monitor_common::CheckStatus`] and assembles [`monitor_common::HealthCheck`]
//! records, with concurrent fan-out across services.

mod engine;
mod transport;

pub use engine::{outcome_to_health_check, outcomes_to_checks, ProbeEngine};
pub use transport::{DirectHttpTransport, ProbeOutcome, ProbeTransport};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use monitor_common::{CheckStatus, MonitoredService, ServiceCatalog, ServiceName};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedTransport {
        status: CheckStatus,
    }

    #[async_trait]
    impl ProbeTransport for FixedTransport {
        async fn probe(&self, _endpoint: &str, _timeout: Duration) -> ProbeOutcome {
            ProbeOutcome {
                status: self.status,
                latency_ms: 1.5,
                http_code: if self.status == CheckStatus::Up { Some(200) } else { None },
                error_message: None,
            }
        }
    }

    fn catalog_with(name: &str) -> ServiceCatalog {
        let mut catalog = ServiceCatalog::new(ServiceName::from("worker"), ServiceName::from("broker"));
        catalog.register(MonitoredService {
            name: name.into(),
            endpoint: format!("http://{name}/health"),
            container: Some(name.to_string()),
        });
        catalog
    }

    #[tokio::test]
    async fn probe_up_produces_up_check() {
        let engine = ProbeEngine::new(Arc::new(FixedTransport { status: CheckStatus::Up }), Duration::from_secs(1));
        let catalog = catalog_with("reserves");
        let check = engine
            .probe(&catalog, &ServiceName::from("reserves"), "ping-1")
            .await
            .unwrap();
        assert_eq!(check.status, CheckStatus::Up);
        assert!(!check.is_failure());
        assert!(check.latency_ms.is_some());
    }

    #[tokio::test]
    async fn probe_unknown_service_is_config_error() {
        let engine = ProbeEngine::new(Arc::new(FixedTransport { status: CheckStatus::Up }), Duration::from_secs(1));
        let catalog = catalog_with("reserves");
        let result = engine.probe(&catalog, &ServiceName::from("ghost"), "ping-1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn probe_many_probes_every_service_concurrently() {
        let engine = ProbeEngine::new(Arc::new(FixedTransport { status: CheckStatus::Down }), Duration::from_secs(1));
        let mut catalog = catalog_with("reserves");
        catalog.register(MonitoredService {
            name: "payments".into(),
            endpoint: "http://payments/health".into(),
            container: None,
        });
        let checks = engine
            .probe_many(
                &catalog,
                &[ServiceName::from("reserves"), ServiceName::from("payments")],
                "ping-2",
            )
            .await;
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|c| c.is_failure()));
    }
}
