//! Monitored-service catalog: process-wide configuration mapping service
//! names to probe endpoints, container names, and the protection set.
//!
//! Grounded in the original `MONITORED_SERVICES` / `SERVICE_TO_CONTAINER` /
//! `DO_NOT_RESTART` module-level dicts — reified here as an explicit owned
//! value built by the binary entry point and passed by reference, per the
//! "process-wide mutable state" design note.

use crate::ids::ServiceName;
use std::collections::{HashMap, HashSet};

/// A single monitored service: where to probe it and (optionally) which
/// container the Recovery Orchestrator should restart for it.
#[derive(Debug, Clone)]
pub struct MonitoredService {
    /// Catalog key.
    pub name: ServiceName,
    /// HTTP health endpoint probed by the Probe Engine.
    pub endpoint: String,
    /// Container-manager identifier used by the Recovery Orchestrator.
    /// `None` for services that have no restart action (e.g. the broker
    /// itself, if it is not container-managed here).
    pub container: Option<String>,
}

/// The full set of services this monitor watches, plus the protection list
/// and the designated work peer / broker tag.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: HashMap<ServiceName, MonitoredService>,
    protected: HashSet<ServiceName>,
    work_peer: ServiceName,
    broker_tag: ServiceName,
}

impl ServiceCatalog {
    /// Start an empty catalog. `work_peer` is probed directly; `broker_tag`
    /// is the synthetic service name used for the broker's own TCP/PING
    /// health check.
    pub fn new(work_peer: ServiceName, broker_tag: ServiceName) -> Self {
        Self {
            services: HashMap::new(),
            protected: HashSet::new(),
            work_peer,
            broker_tag,
        }
    }

    /// Register (or replace) a monitored service.
    pub fn register(&mut self, service: MonitoredService) {
        self.services.insert(service.name.clone(), service);
    }

    /// Mark a service as exempt from automatic restart.
    pub fn protect(&mut self, name: ServiceName) {
        self.protected.insert(name);
    }

    /// Look up a service's probe endpoint.
    pub fn endpoint(&self, name: &ServiceName) -> Option<&str> {
        self.services.get(name).map(|s| s.endpoint.as_str())
    }

    /// Look up a service's restart container, if any.
    pub fn container(&self, name: &ServiceName) -> Option<&str> {
        self.services.get(name).and_then(|s| s.container.as_deref())
    }

    /// True iff `name` is exempt from automatic restart.
    pub fn is_protected(&self, name: &ServiceName) -> bool {
        self.protected.contains(name)
    }

    /// True iff `name` is a registered service (or the broker tag).
    pub fn contains(&self, name: &ServiceName) -> bool {
        self.services.contains_key(name) || name == &self.broker_tag
    }

    /// The service probed directly (bypassing the broker).
    pub fn work_peer(&self) -> &ServiceName {
        &self.work_peer
    }

    /// The synthetic service name for the broker's own health check.
    pub fn broker_tag(&self) -> &ServiceName {
        &self.broker_tag
    }

    /// All registered services (excludes the synthetic broker tag, which
    /// is not "registered" — it has no HTTP endpoint).
    pub fn services(&self) -> impl Iterator<Item = &MonitoredService> {
        self.services.values()
    }

    /// Every service the broker fan-out must probe: all registered
    /// services except the work peer (probed directly), per §4.B.
    pub fn fan_out_services(&self) -> Vec<ServiceName> {
        self.services
            .keys()
            .filter(|s| *s != &self.work_peer)
            .cloned()
            .collect()
    }

    /// Every name the Detector/Metrics should evaluate: the fan-out set
    /// plus the work peer plus the broker tag.
    pub fn all_service_names(&self) -> Vec<ServiceName> {
        let mut names: Vec<ServiceName> = self.services.keys().cloned().collect();
        names.push(self.broker_tag.clone());
        names.sort();
        names.dedup();
        names
    }

    /// The reference fleet from the original deployment: an API gateway, a
    /// reserves/payments/search trio, a Celery-style work peer, and the
    /// broker's own infrastructure tag (protected by default).
    pub fn default_fleet() -> Self {
        let mut catalog = Self::new(ServiceName::from("worker"), ServiceName::from("broker"));
        catalog.register(MonitoredService {
            name: "api-gateway".into(),
            endpoint: "http://api-gateway:5000/health".into(),
            container: Some("api-gateway".into()),
        });
        catalog.register(MonitoredService {
            name: "reserves".into(),
            endpoint: "http://reserves-service:5001/health".into(),
            container: Some("reserves-service".into()),
        });
        catalog.register(MonitoredService {
            name: "payments".into(),
            endpoint: "http://payments-service:5002/health".into(),
            container: Some("payments-service".into()),
        });
        catalog.register(MonitoredService {
            name: "search".into(),
            endpoint: "http://search-service:5003/health".into(),
            container: Some("search-service".into()),
        });
        catalog.register(MonitoredService {
            name: "worker".into(),
            endpoint: "http://celery-worker:5005/health".into(),
            container: Some("celery-worker".into()),
        });
        catalog.protect(ServiceName::from("broker"));
        catalog
    }
}
