//! HTTP probe transport and outcome classification (§4.B).
//!
//! Mirrors the original `_ping_worker_direct` classification table: 2xx ->
//! UP, non-2xx -> DEGRADED, timeout -> TIMEOUT, connection refused/DNS ->
//! DOWN, any other exception -> DOWN.

use async_trait::async_trait;
use monitor_common::CheckStatus;
use std::time::{Duration, Instant};

/// One probe attempt's classified outcome, prior to being turned into a
/// [`monitor_common::HealthCheck`] (which also needs a `service` and
/// `request_id` the transport doesn't know about).
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Classified status.
    pub status: CheckStatus,
    /// Wall-clock round-trip time, measured even on failure/timeout.
    pub latency_ms: f64,
    /// HTTP status code, when one was received.
    pub http_code: Option<u16>,
    /// Human-readable detail, set on DOWN/TIMEOUT.
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// True iff this outcome counts as a failure (`DOWN`/`TIMEOUT`;
    /// `UNHEALTHY` is never produced by the HTTP transport).
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Pluggable probe transport — `DirectHttpTransport` in production, a fake
/// in tests.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Probe `endpoint` with a hard deadline of `timeout`. Never returns
    /// `Err` — every failure mode (refused connection, DNS error, deadline
    /// elapsed, non-2xx) is an observation captured in [`ProbeOutcome`],
    /// per §7 ("probe/broker failures are observations, not exceptions").
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeOutcome;
}

/// Real transport: a `reqwest::Client` wrapped in a `tokio::time::timeout`.
pub struct DirectHttpTransport {
    client: reqwest::Client,
}

impl DirectHttpTransport {
    /// Build a transport with reqwest's own connect/request timeouts left
    /// at default — the *deadline* enforced here is the outer
    /// `tokio::time::timeout`, which also catches a hung connect.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for DirectHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProbeTransport for DirectHttpTransport {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeOutcome {
        let started = Instant::now();
        let result = tokio::time::timeout(timeout, self.client.get(endpoint).send()).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Err(_elapsed) => ProbeOutcome {
                status: CheckStatus::Timeout,
                latency_ms,
                http_code: None,
                error_message: Some("timeout".to_string()),
            },
            Ok(Err(e)) => {
                // reqwest folds connection-refused, DNS failure, and TLS
                // errors all under `is_connect()`; everything else (body
                // read errors, etc.) is still classified DOWN per §4.B's
                // "other exception" row.
                let _ = e.is_connect();
                ProbeOutcome {
                    status: CheckStatus::Down,
                    latency_ms,
                    http_code: None,
                    error_message: Some(e.to_string()),
                }
            }
            Ok(Ok(response)) => {
                let code = response.status().as_u16();
                if response.status().is_success() {
                    ProbeOutcome {
                        status: CheckStatus::Up,
                        latency_ms,
                        http_code: Some(code),
                        error_message: None,
                    }
                } else {
                    ProbeOutcome {
                        status: CheckStatus::Degraded,
                        latency_ms,
                        http_code: Some(code),
                        error_message: None,
                    }
                }
            }
        }
    }
}
