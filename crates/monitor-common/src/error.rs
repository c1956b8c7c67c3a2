//! Crate-wide error taxonomy.
//!
//! Probe failures and broker-enqueue failures are *not* represented here —
//! per the monitoring design those are observations, not exceptions, and
//! are classified into [`crate::health_check::CheckStatus`] instead. This
//! enum covers the small set of failures that are genuinely exceptional:
//! store I/O, invalid configuration, and recovery-action plumbing.

use thiserror::Error;

/// Result type used throughout the monitoring core.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors surfaced by the monitoring core.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The persistent store could not complete a read or write after its
    /// retry budget was exhausted.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration failed validation at boot (negative thresholds, a
    /// non-positive interval, etc). This is always fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested service is not present in the monitored-service catalog.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// The broker could not accept an enqueue request.
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// A caller-supplied query parameter failed validation (Read API).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
