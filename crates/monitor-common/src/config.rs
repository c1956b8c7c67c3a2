//! Process configuration, validated once at boot.
//!
//! Per the "process-wide mutable state" design note, this is a plain owned
//! value constructed by the binary entry point and threaded through by
//! reference (or `Arc`) — never a lazily-initialized global.

use crate::error::{MonitorError, MonitorResult};
use std::time::Duration;

/// Validated monitor configuration. Construct via [`MonitorConfig::validate`]
/// (or the CLI layer in `monitor-server`, which fills this in from
/// env/flags and calls `validate` before using it).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// `MONITOR_PING_INTERVAL_SECONDS` — scheduler tick interval.
    pub ping_interval: Duration,
    /// `PING_TIMEOUT_SECONDS` — hard per-probe deadline.
    pub ping_timeout: Duration,
    /// `CONSECUTIVE_FAILURES_THRESHOLD` — N_fail.
    pub n_fail: u32,
    /// `RECOVERY_CHECK_THRESHOLD` — N_ok.
    pub n_ok: u32,
    /// `BROKER_URL` — informational; the in-process broker doesn't dial
    /// out, but the value is surfaced in `/status` and logs for parity
    /// with a real broker-backed deployment.
    pub broker_url: String,
    /// `STORE_PATH` — SQLite file path (or `:memory:` for tests).
    pub store_path: String,
    /// `AUTO_RECOVERY_ENABLED` — policy flag gating the Recovery subsystem.
    pub auto_recovery_enabled: bool,
    /// Recovery action timeout (default 30s, §5).
    pub recovery_timeout: Duration,
    /// Number of broker-consumer worker tasks (ambient; not in the wire
    /// contract, but required to size the concurrent fan-out pool, §5).
    pub broker_consumer_workers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(5),
            n_fail: 3,
            n_ok: 3,
            broker_url: "memory://local".to_string(),
            store_path: "monitor.db".to_string(),
            auto_recovery_enabled: true,
            recovery_timeout: Duration::from_secs(30),
            broker_consumer_workers: 2,
        }
    }
}

impl MonitorConfig {
    /// Fail fast on nonsensical configuration: non-positive interval,
    /// non-positive timeouts, non-positive thresholds.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.ping_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "ping_interval must be > 0".into(),
            ));
        }
        if self.ping_timeout.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "ping_timeout must be > 0".into(),
            ));
        }
        if self.n_fail == 0 {
            return Err(MonitorError::InvalidConfig("n_fail must be >= 1".into()));
        }
        if self.n_ok == 0 {
            return Err(MonitorError::InvalidConfig("n_ok must be >= 1".into()));
        }
        if self.recovery_timeout.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "recovery_timeout must be > 0".into(),
            ));
        }
        if self.broker_consumer_workers == 0 {
            return Err(MonitorError::InvalidConfig(
                "broker_consumer_workers must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MonitorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.ping_interval = Duration::from_secs(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.n_fail = 0;
        assert!(cfg.validate().is_err());
    }
}
