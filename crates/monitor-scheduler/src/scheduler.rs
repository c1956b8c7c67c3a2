use crate::status::SchedulerStatus;
use chrono::Utc;
use monitor_broker::{Broker, EchoMessage, EchoResult, PingRequest};
use monitor_common::{CheckStatus, HealthCheck, MonitorConfig, MonitorResult, RequestId, ServiceCatalog};
use monitor_detector::IncidentDetector;
use monitor_probe::{outcome_to_health_check, ProbeEngine, ProbeOutcome};
use monitor_store::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Ties the Probe Engine, Broker, and Incident Detector together on a
/// fixed interval (§4.F). Also hosts the broker-consumer handlers for
/// `monitoring.ping` (fan-out probing) and `monitoring.echo` (result
/// ingestion), since that consumer logic is part of this core's hybrid
/// dispatch rather than an external collaborator.
pub struct Scheduler {
    catalog: Arc<ServiceCatalog>,
    store: Arc<dyn Store>,
    broker: Arc<dyn Broker>,
    probe_engine: Arc<ProbeEngine>,
    detector: Arc<IncidentDetector>,
    ping_interval: Duration,
    ping_timeout: Duration,
    status: Arc<SchedulerStatus>,
    stop: Arc<AtomicBool>,
}

impl Scheduler {
    /// Build a scheduler from its collaborators and `config`.
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        store: Arc<dyn Store>,
        broker: Arc<dyn Broker>,
        probe_engine: Arc<ProbeEngine>,
        detector: Arc<IncidentDetector>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            broker,
            probe_engine,
            detector,
            ping_interval: config.ping_interval,
            ping_timeout: config.ping_timeout,
            status: Arc::new(SchedulerStatus::new(config.ping_interval)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared status handle for the Read API's `GET /status`.
    pub fn status(&self) -> Arc<SchedulerStatus> {
        self.status.clone()
    }

    /// Signal the loop spawned by [`Scheduler::spawn`] to stop after its
    /// current tick (cooperative, not forcible).
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Run the fixed-interval loop until [`Scheduler::stop`] is called.
    /// Per §4.F, drift accumulates (sleeps a fixed interval *after* each
    /// tick completes) and catch-up is never attempted.
    pub async fn run(self: Arc<Self>) {
        self.status.set_running(true);
        while !self.stop.load(Ordering::SeqCst) {
            if let Err(e) = self.tick().await {
                warn!(error = %e, "scheduler tick failed");
            }
            tokio::time::sleep(self.ping_interval).await;
        }
        self.status.set_running(false);
    }

    /// One scheduler tick: direct work-peer probe, then conditional
    /// broker fan-out enqueue. Returns the tick's `request_id`.
    pub async fn tick(&self) -> MonitorResult<String> {
        let request_id = RequestId::generate();
        let work_peer = self.catalog.work_peer().clone();

        let check = self.probe_engine.probe(&self.catalog, &work_peer, request_id.as_str()).await?;
        let peer_up = check.status == CheckStatus::Up;
        self.store.append_check(check).await?;
        self.detector.evaluate(&work_peer).await?;

        self.status.record_ping(Utc::now());

        if peer_up {
            if let Err(e) = self
                .broker
                .publish_ping(PingRequest {
                    request_id: request_id.as_str().to_string(),
                })
                .await
            {
                // §7: broker-unavailable on enqueue is logged and this
                // tick's fan-out is skipped; the direct probe already ran.
                warn!(error = %e, "broker unavailable, skipping fan-out for this tick");
            }
        } else {
            debug!(%work_peer, "work peer not UP, skipping broker fan-out");
        }

        Ok(request_id.as_str().to_string())
    }

    /// Force the Detector to re-evaluate every catalog service
    /// (`POST /evaluate`).
    pub async fn evaluate_all(&self) -> MonitorResult<()> {
        for service in self.catalog.all_service_names() {
            self.detector.evaluate(&service).await?;
        }
        Ok(())
    }

    /// Handle one `monitoring.ping` fan-out request: probe every
    /// non-work-peer service concurrently, probe the broker itself, and
    /// publish the result batch as a `monitoring.echo` message.
    pub async fn handle_fan_out_ping(&self, ping: PingRequest) {
        let fan_out = self.catalog.fan_out_services();
        let mut checks = self
            .probe_engine
            .probe_many(&self.catalog, &fan_out, &ping.request_id)
            .await;
        checks.push(self.probe_broker_self().await);

        let results = checks
            .iter()
            .map(|c| EchoResult {
                service: c.service.clone(),
                status: c.status,
                latency_ms: c.latency_ms,
                http_code: c.http_code,
                is_failure: c.is_failure(),
            })
            .collect();

        let echo = EchoMessage {
            request_id: ping.request_id,
            ts: Utc::now(),
            results,
        };
        if let Err(e) = self.broker.publish_echo(echo).await {
            warn!(error = %e, "failed to publish echo for fan-out ping");
        }
    }

    async fn probe_broker_self(&self) -> HealthCheck {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.ping_timeout, self.broker.self_check()).await {
            Ok(true) => ProbeOutcome {
                status: CheckStatus::Up,
                latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                http_code: None,
                error_message: None,
            },
            Ok(false) => ProbeOutcome {
                status: CheckStatus::Down,
                latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                http_code: None,
                error_message: Some("broker self-check failed".to_string()),
            },
            Err(_elapsed) => ProbeOutcome {
                status: CheckStatus::Timeout,
                latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                http_code: None,
                error_message: Some("timeout".to_string()),
            },
        };
        outcome_to_health_check(self.catalog.broker_tag().clone(), "broker-self-check", outcome)
    }

    /// Handle one `monitoring.echo` batch: persist every result and run
    /// the Detector for each service it touched.
    pub async fn handle_echo(&self, echo: EchoMessage) -> MonitorResult<()> {
        let mut services = Vec::with_capacity(echo.results.len());
        for result in echo.results {
            let check = HealthCheck {
                id: 0,
                service: result.service.clone(),
                request_id: echo.request_id.clone(),
                status: result.status,
                latency_ms: result.latency_ms,
                http_code: result.http_code,
                timestamp: echo.ts,
                is_timeout: result.status == CheckStatus::Timeout,
                error_message: None,
            };
            services.push(result.service);
            self.store.append_check(check).await?;
        }

        for service in &services {
            self.detector.evaluate(service).await?;
        }

        self.status.record_echo(Utc::now());
        info!(request_id = %echo.request_id, services = services.len(), "echo processed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use monitor_broker::InMemoryBroker;
    use monitor_detector::{IncidentDetector, NoopHook};
    use monitor_probe::{ProbeOutcome, ProbeTransport};
    use monitor_store::SqliteStore;
    use std::sync::atomic::AtomicUsize;

    /// A transport that always answers `status`, counting how many times
    /// it was called — lets tests assert fan-out concurrency without a
    /// real HTTP endpoint.
    struct FixedTransport {
        status: CheckStatus,
        calls: AtomicUsize,
    }

    impl FixedTransport {
        fn new(status: CheckStatus) -> Self {
            Self {
                status,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProbeTransport for FixedTransport {
        async fn probe(&self, _endpoint: &str, _timeout: Duration) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProbeOutcome {
                status: self.status,
                latency_ms: 1.0,
                http_code: if self.status == CheckStatus::Up { Some(200) } else { None },
                error_message: None,
            }
        }
    }

    fn build_scheduler(status: CheckStatus) -> (Scheduler, InMemoryBroker) {
        let catalog = Arc::new(ServiceCatalog::default_fleet());
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let broker_impl = InMemoryBroker::new();
        let broker: Arc<dyn Broker> = Arc::new(broker_impl.clone());
        let config = MonitorConfig::default();
        let probe_engine = Arc::new(ProbeEngine::new(Arc::new(FixedTransport::new(status)), config.ping_timeout));
        let detector = Arc::new(IncidentDetector::new(store.clone(), Arc::new(NoopHook), &config));
        (Scheduler::new(catalog, store, broker, probe_engine, detector, &config), broker_impl)
    }

    #[tokio::test]
    async fn tick_probes_the_work_peer_and_fans_out_on_up() {
        let (scheduler, _broker) = build_scheduler(CheckStatus::Up);
        let request_id = scheduler.tick().await.unwrap();
        assert!(!request_id.is_empty());
        assert_eq!(scheduler.status.snapshot().ping_count, 1);
    }

    #[tokio::test]
    async fn tick_skips_fan_out_when_work_peer_is_down() {
        let (scheduler, _broker) = build_scheduler(CheckStatus::Down);
        // A failing direct probe must not prevent the tick from completing
        // or recording the ping — it only gates the broker fan-out publish.
        scheduler.tick().await.unwrap();
        assert_eq!(scheduler.status.snapshot().ping_count, 1);
    }

    #[tokio::test]
    async fn handle_fan_out_ping_publishes_an_echo_with_one_result_per_service() {
        let (scheduler, broker) = build_scheduler(CheckStatus::Up);
        let mut consumer = broker.consumer();
        scheduler
            .handle_fan_out_ping(PingRequest {
                request_id: "req-1".to_string(),
            })
            .await;
        let echo = consumer.next_echo().await.unwrap();
        // fan_out_services() + the synthetic broker self-check.
        let expected = scheduler.catalog.fan_out_services().len() + 1;
        assert_eq!(echo.results.len(), expected);
        assert_eq!(echo.request_id, "req-1");
    }

    #[tokio::test]
    async fn handle_echo_persists_every_result_and_evaluates_each_service() {
        let (scheduler, _broker) = build_scheduler(CheckStatus::Up);
        let echo = EchoMessage {
            request_id: "req-2".to_string(),
            ts: Utc::now(),
            results: vec![EchoResult {
                service: "reserves".into(),
                status: CheckStatus::Down,
                latency_ms: Some(5.0),
                http_code: None,
                is_failure: true,
            }],
        };
        scheduler.handle_echo(echo).await.unwrap();
        let checks = scheduler.store.recent_checks(&"reserves".into(), 10).await.unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, CheckStatus::Down);
    }

    #[tokio::test]
    async fn evaluate_all_covers_every_catalog_service() {
        let (scheduler, _broker) = build_scheduler(CheckStatus::Up);
        assert!(scheduler.evaluate_all().await.is_ok());
    }

    #[tokio::test]
    async fn stop_flips_the_status_flag_observed_by_run() {
        let (scheduler, _broker) = build_scheduler(CheckStatus::Up);
        let scheduler = Arc::new(scheduler);
        let handle = tokio::spawn({
            let scheduler = scheduler.clone();
            async move { scheduler.run().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.stop();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert!(!scheduler.status().snapshot().running);
    }
}
