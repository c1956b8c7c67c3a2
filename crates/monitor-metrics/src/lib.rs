//! Metrics Engine (§4.E): MTTD/MTTR/MTBF/availability aggregation and the
//! ASR-03 "three nines" monthly downtime-budget compliance projection.
//! Grounded directly on `app/monitor/metrics.py`.

mod calc;
mod types;

pub use calc::{calculate_availability, calculate_health_check_stats, calculate_mtbf, calculate_mttd, calculate_mttr};
pub use types::{
    Asr03Compliance, Availability, ExperimentSummary, FleetMetrics, GlobalMetrics, HealthCheckStats, IncidentCounts,
    ServiceMetrics, Stat,
};

use calc::{GLOBAL_INCIDENTS_LIMIT, RECENT_CHECKS_SAMPLE, SERVICE_INCIDENTS_LIMIT};
use chrono::Utc;
use monitor_common::{MonitorResult, ServiceCatalog, ServiceName};
use monitor_store::Store;
use std::collections::HashMap;
use std::sync::Arc;

/// ASR-03's fixed monthly downtime budget: 21.6 minutes ("three nines").
pub const MAX_MONTHLY_DOWNTIME_MINUTES: f64 = 21.6;
const MONTH_SECONDS: f64 = 30.0 * 24.0 * 3600.0;

/// Computes metrics on demand from the [`Store`]; holds no cached state
/// of its own so every call reflects the latest persisted data.
pub struct MetricsEngine {
    store: Arc<dyn Store>,
    catalog: Arc<ServiceCatalog>,
}

impl MetricsEngine {
    /// Build an engine reading from `store`, scoped to the services in
    /// `catalog`.
    pub fn new(store: Arc<dyn Store>, catalog: Arc<ServiceCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Full metrics snapshot for a single service.
    pub async fn service_metrics(&self, service: &ServiceName, window_hours: f64) -> MonitorResult<ServiceMetrics> {
        let incidents = self.store.incidents(Some(service), SERVICE_INCIDENTS_LIMIT).await?;
        let checks = self.store.recent_checks(service, RECENT_CHECKS_SAMPLE).await?;
        Ok(self.assemble_service_metrics(service.to_string(), &incidents, &checks, window_hours))
    }

    fn assemble_service_metrics(
        &self,
        service: String,
        incidents: &[monitor_common::Incident],
        checks: &[monitor_common::HealthCheck],
        window_hours: f64,
    ) -> ServiceMetrics {
        let now = Utc::now();
        let active = incidents.iter().filter(|i| i.is_active()).count();
        let resolved_incidents: Vec<_> = incidents.iter().filter(|i| !i.is_active()).cloned().collect();

        ServiceMetrics {
            service,
            incidents: IncidentCounts {
                total: incidents.len(),
                active,
                resolved: resolved_incidents.len(),
            },
            mttd: calculate_mttd(incidents),
            mttr: calculate_mttr(&resolved_incidents),
            mtbf_avg_seconds: calculate_mtbf(&resolved_incidents),
            availability: calculate_availability(incidents, window_hours, now),
            health_checks: calculate_health_check_stats(checks),
        }
    }

    /// Metrics for every catalog service plus the `_global` roll-up.
    pub async fn fleet_metrics(&self, window_hours: f64) -> MonitorResult<FleetMetrics> {
        let mut services = HashMap::new();
        for name in self.catalog.all_service_names() {
            let metrics = self.service_metrics(&name, window_hours).await?;
            services.insert(name.to_string(), metrics);
        }

        let all_incidents = self.store.incidents(None, GLOBAL_INCIDENTS_LIMIT).await?;
        let resolved: Vec<_> = all_incidents.iter().filter(|i| !i.is_active()).cloned().collect();
        let now = Utc::now();

        let global = GlobalMetrics {
            total_incidents: all_incidents.len(),
            active_incidents: all_incidents.iter().filter(|i| i.is_active()).count(),
            mttd_avg_seconds: calculate_mttd(&all_incidents).avg_seconds,
            mttr_avg_seconds: calculate_mttr(&resolved).avg_seconds,
            availability: calculate_availability(&all_incidents, window_hours, now),
        };

        Ok(FleetMetrics { services, global })
    }

    /// ASR-03 compliance projection plus the fleet metrics it derives from.
    pub async fn experiment_summary(&self, window_hours: f64) -> MonitorResult<ExperimentSummary> {
        let metrics = self.fleet_metrics(window_hours).await?;
        let compliance = project_asr03(metrics.global.availability.total_downtime_seconds, window_hours);

        Ok(ExperimentSummary {
            experiment_window_hours: window_hours,
            asr03_compliance: compliance,
            metrics,
        })
    }
}

/// Linearly extrapolates observed downtime over `window_hours` to a
/// 30-day month and checks it against the 21.6 minute/month budget.
/// `None` fields when `window_hours == 0` or downtime is unavailable
/// (§8 boundary case).
fn project_asr03(observed_downtime_seconds: Option<f64>, window_hours: f64) -> Asr03Compliance {
    let (compliant, projected_minutes, margin) = match observed_downtime_seconds {
        Some(downtime) if window_hours > 0.0 => {
            let ratio = downtime / (window_hours * 3600.0);
            let projected_seconds = ratio * MONTH_SECONDS;
            let projected_minutes = projected_seconds / 60.0;
            let compliant = projected_minutes <= MAX_MONTHLY_DOWNTIME_MINUTES;
            let margin = MAX_MONTHLY_DOWNTIME_MINUTES - projected_minutes;
            (Some(compliant), Some(projected_minutes), Some(margin))
        }
        _ => (None, None, None),
    };

    Asr03Compliance {
        compliant,
        projected_monthly_downtime_minutes: projected_minutes,
        max_allowed_monthly_downtime_minutes: MAX_MONTHLY_DOWNTIME_MINUTES,
        margin_minutes: margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_common::MonitoredService;
    use monitor_store::SqliteStore;

    fn catalog() -> ServiceCatalog {
        let mut catalog = ServiceCatalog::new(ServiceName::from("worker"), ServiceName::from("broker"));
        catalog.register(MonitoredService {
            name: "reserves".into(),
            endpoint: "http://reserves/health".into(),
            container: Some("reserves-service".into()),
        });
        catalog
    }

    #[tokio::test]
    async fn service_with_no_data_is_100_percent_available() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let engine = MetricsEngine::new(store, Arc::new(catalog()));
        let metrics = engine
            .service_metrics(&ServiceName::from("reserves"), 24.0)
            .await
            .unwrap();
        assert_eq!(metrics.availability.percent, Some(100.0));
        assert_eq!(metrics.incidents.total, 0);
        assert_eq!(metrics.health_checks.success_rate_percent, 100.0);
    }

    #[tokio::test]
    async fn window_hours_zero_yields_none_availability() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let engine = MetricsEngine::new(store, Arc::new(catalog()));
        let metrics = engine
            .service_metrics(&ServiceName::from("reserves"), 0.0)
            .await
            .unwrap();
        assert!(metrics.availability.percent.is_none());
    }

    #[tokio::test]
    async fn fleet_metrics_includes_broker_tag() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let engine = MetricsEngine::new(store, Arc::new(catalog()));
        let fleet = engine.fleet_metrics(24.0).await.unwrap();
        assert!(fleet.services.contains_key("broker"));
        assert!(fleet.services.contains_key("reserves"));
    }

    #[tokio::test]
    async fn experiment_summary_reports_compliance_with_no_downtime() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let engine = MetricsEngine::new(store, Arc::new(catalog()));
        let summary = engine.experiment_summary(1.0).await.unwrap();
        assert_eq!(summary.asr03_compliance.compliant, Some(true));
        assert_eq!(summary.asr03_compliance.max_allowed_monthly_downtime_minutes, 21.6);
    }

    #[tokio::test]
    async fn experiment_summary_window_zero_compliance_is_none() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let engine = MetricsEngine::new(store, Arc::new(catalog()));
        let summary = engine.experiment_summary(0.0).await.unwrap();
        assert!(summary.asr03_compliance.compliant.is_none());
    }
}
