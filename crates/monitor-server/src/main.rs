//! Fleet health-monitoring and auto-recovery control plane: binary entry
//! point.
//!
//! Wires Store → Probe Engine → Broker → Detector → Recovery → Scheduler
//! → Read API and runs them concurrently under one Tokio runtime, per
//! SPEC_FULL.md §2's expanded flow.

mod cli;
mod consumer;
mod shutdown;

use clap::Parser;
use cli::Cli;
use monitor_api::{build_router, ApiState};
use monitor_broker::{Broker, InMemoryBroker};
use monitor_common::ServiceCatalog;
use monitor_detector::{IncidentDetector, RecoveryHook};
use monitor_metrics::MetricsEngine;
use monitor_probe::{DirectHttpTransport, ProbeEngine};
use monitor_recovery::{DockerCliRestartAction, RecoveryOrchestrator};
use monitor_scheduler::Scheduler;
use monitor_store::{SqliteStore, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let listen_addr = cli.listen_addr.clone();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            // §7: invalid configuration is fatal at boot, with an
            // explicit message — never a panic or silent default.
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        ping_interval = ?config.ping_interval,
        n_fail = config.n_fail,
        n_ok = config.n_ok,
        auto_recovery_enabled = config.auto_recovery_enabled,
        "starting fleet-monitor"
    );

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config.store_path).unwrap_or_else(|e| {
        eprintln!("failed to open store at {}: {e}", config.store_path);
        std::process::exit(1);
    }));

    let catalog = Arc::new(ServiceCatalog::default_fleet());

    let broker_impl = InMemoryBroker::new();
    let broker: Arc<dyn Broker> = Arc::new(broker_impl.clone());

    let probe_engine = Arc::new(ProbeEngine::new(Arc::new(DirectHttpTransport::new()), config.ping_timeout));

    let recovery = Arc::new(RecoveryOrchestrator::new(
        catalog.clone(),
        Arc::new(DockerCliRestartAction),
        &config,
    ));
    let hook: Arc<dyn RecoveryHook> = recovery;

    let detector = Arc::new(IncidentDetector::new(store.clone(), hook, &config));

    let scheduler = Arc::new(Scheduler::new(
        catalog.clone(),
        store.clone(),
        broker.clone(),
        probe_engine,
        detector,
        &config,
    ));

    consumer::spawn(config.broker_consumer_workers, || broker_impl.consumer(), scheduler.clone());

    let scheduler_loop = scheduler.clone();
    tokio::spawn(async move { scheduler_loop.run().await });

    let metrics = Arc::new(MetricsEngine::new(store.clone(), catalog.clone()));
    let app = build_router(ApiState {
        store,
        metrics,
        scheduler: scheduler.clone(),
        catalog,
    });

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {listen_addr}: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %listen_addr, "Read API listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::wait_for_shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Read API server exited with error");
    }

    scheduler.stop();
}
