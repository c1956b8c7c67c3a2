//! In-process stand-in for the fleet message broker (§6, Component H).
//!
//! The real broker — a FIFO, at-least-once JSON queue transport shared with
//! the business microservices — is an external collaborator, out of scope.
//! This crate models only the two queues the monitoring core actually
//! consumes (`monitoring.ping`, `monitoring.echo`) behind a trait, so the
//! Scheduler and the fan-out probe consumer depend on behavior rather than
//! on a specific transport. The default implementation is a Tokio-mpsc
//! channel pair standing in for the real broker.

mod contract;
mod memory;

pub use contract::{EchoMessage, EchoResult, PingRequest, QUEUE_ECHO, QUEUE_PING};
pub use memory::InMemoryBroker;

use async_trait::async_trait;
use monitor_common::MonitorResult;

/// Queue name for business-operation messages (`ops.process`). Named here
/// for schema/contract completeness per §6; this core neither produces nor
/// consumes it — that is the external API gateway and job worker's job.
pub const QUEUE_OPS_PROCESS: &str = "ops.process";

/// Publish side of the broker contract, as used by the Scheduler.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Enqueue a fan-out probe request. Per §4.F/§7, a broker-unavailable
    /// condition is logged and the tick's fan-out is skipped — callers
    /// should not treat this as fatal.
    async fn publish_ping(&self, request: PingRequest) -> MonitorResult<()>;

    /// Publish a probe-result batch, as emitted by the fan-out probe
    /// consumer once it has probed every non-work-peer service.
    async fn publish_echo(&self, echo: EchoMessage) -> MonitorResult<()>;

    /// The broker's own health signal (§4.B: "a TCP/PING call to the
    /// broker itself"), independent of the `monitoring.ping` queue so a
    /// self-check can never recursively trigger another fan-out round.
    async fn self_check(&self) -> bool;
}

/// Consume side of the broker contract, held by worker tasks.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Block until the next `monitoring.ping` request is available, or
    /// `None` once the broker has been closed (shutdown).
    async fn next_ping(&mut self) -> Option<PingRequest>;

    /// Block until the next `monitoring.echo` batch is available, or
    /// `None` once the broker has been closed (shutdown).
    async fn next_echo(&mut self) -> Option<EchoMessage>;
}
