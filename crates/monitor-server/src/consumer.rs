//! Broker-consumer worker pool (§5): `N` tasks pulling `monitoring.ping`
//! fan-out requests and `monitoring.echo` result batches off the same two
//! in-memory queues, handed to the Scheduler's consumer-side handlers.

use monitor_broker::{Consumer, InMemoryConsumer};
use monitor_scheduler::Scheduler;
use std::sync::Arc;
use tracing::error;

/// Spawn `workers` consumer tasks, each looping until the broker's queues
/// are closed (shutdown). Every task competes for the same two queues, so
/// fan-out probing and Echo ingestion both scale with `workers`.
pub fn spawn(workers: usize, consumer_factory: impl Fn() -> InMemoryConsumer, scheduler: Arc<Scheduler>) {
    for id in 0..workers {
        let mut consumer = consumer_factory();
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    ping = consumer.next_ping() => {
                        match ping {
                            Some(request) => scheduler.handle_fan_out_ping(request).await,
                            None => break,
                        }
                    }
                    echo = consumer.next_echo() => {
                        match echo {
                            Some(message) => {
                                if let Err(e) = scheduler.handle_echo(message).await {
                                    error!(worker = id, error = %e, "failed to ingest echo batch");
                                }
                            }
                            None => break,
                        }
                    }
                }
            }
        });
    }
}
