//! Wire shapes for the two named queues this core consumes (§6):
//! `monitoring.ping` (fan-out request) and `monitoring.echo` (result batch).

use chrono::{DateTime, Utc};
use monitor_common::{CheckStatus, ServiceName};
use serde::{Deserialize, Serialize};

/// `monitoring.ping` queue name.
pub const QUEUE_PING: &str = "monitoring.ping";
/// `monitoring.echo` queue name.
pub const QUEUE_ECHO: &str = "monitoring.echo";

/// Fan-out probe request, carrying the tick's correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRequest {
    /// Correlation id shared with the direct work-peer probe.
    pub request_id: String,
}

/// One service's outcome inside an Echo's result batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoResult {
    /// Service the result pertains to.
    pub service: ServiceName,
    /// Classified outcome.
    pub status: CheckStatus,
    /// Round-trip time, when observed.
    pub latency_ms: Option<f64>,
    /// HTTP status code, when one was received.
    pub http_code: Option<u16>,
    /// Convenience flag mirroring `status.is_failure()`, carried over the
    /// wire so consumers never need the enum to filter failures.
    pub is_failure: bool,
}

/// Probe-result batch emitted by the fan-out probe task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EchoMessage {
    /// Correlation id from the triggering `PingRequest`.
    pub request_id: String,
    /// Moment the batch was produced.
    pub ts: DateTime<Utc>,
    /// One entry per fanned-out service.
    pub results: Vec<EchoResult>,
}
