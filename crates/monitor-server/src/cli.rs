//! Process configuration surface: env vars and CLI flags, per §6's
//! `MONITOR_PING_INTERVAL_SECONDS` / `PING_TIMEOUT_SECONDS` / ... table,
//! mirroring the teacher CLI's `#[arg(env = "...")]` convention
//! (`cli/src/main.rs`).

use clap::Parser;
use monitor_common::MonitorConfig;
use std::time::Duration;

/// Fleet health-monitoring and auto-recovery control plane.
#[derive(Debug, Parser)]
#[command(name = "fleet-monitor", version, about, long_about = None)]
pub struct Cli {
    /// Scheduler tick interval.
    #[arg(long, env = "MONITOR_PING_INTERVAL_SECONDS", default_value_t = 5)]
    pub ping_interval_seconds: u64,

    /// Hard per-probe deadline.
    #[arg(long, env = "PING_TIMEOUT_SECONDS", default_value_t = 5)]
    pub ping_timeout_seconds: u64,

    /// N_fail — consecutive failures required to open an incident.
    #[arg(long, env = "CONSECUTIVE_FAILURES_THRESHOLD", default_value_t = 3)]
    pub n_fail: u32,

    /// N_ok — consecutive non-failures required to close an incident.
    #[arg(long, env = "RECOVERY_CHECK_THRESHOLD", default_value_t = 3)]
    pub n_ok: u32,

    /// Informational broker address; the in-process broker doesn't dial
    /// out, but the value is surfaced in `/status` and logs.
    #[arg(long, env = "BROKER_URL", default_value = "memory://local")]
    pub broker_url: String,

    /// SQLite file path, or `:memory:` for an ephemeral store.
    #[arg(long, env = "STORE_PATH", default_value = "monitor.db")]
    pub store_path: String,

    /// Policy flag gating the Recovery Orchestrator entirely.
    #[arg(long, env = "AUTO_RECOVERY_ENABLED", default_value_t = true)]
    pub auto_recovery_enabled: bool,

    /// Bounded timeout for a single restart action.
    #[arg(long, env = "RECOVERY_TIMEOUT_SECONDS", default_value_t = 30)]
    pub recovery_timeout_seconds: u64,

    /// Number of broker-consumer worker tasks (§5).
    #[arg(long, env = "BROKER_CONSUMER_WORKERS", default_value_t = 2)]
    pub broker_consumer_workers: usize,

    /// Address the Read API binds to.
    #[arg(long, env = "MONITOR_LISTEN_ADDR", default_value = "0.0.0.0:8090")]
    pub listen_addr: String,
}

impl Cli {
    /// Build the validated [`MonitorConfig`] this process runs with.
    /// Validation failure is fatal at boot (§7: "invalid config ...
    /// fail fast with explicit message").
    pub fn into_config(self) -> monitor_common::MonitorResult<MonitorConfig> {
        let config = MonitorConfig {
            ping_interval: Duration::from_secs(self.ping_interval_seconds),
            ping_timeout: Duration::from_secs(self.ping_timeout_seconds),
            n_fail: self.n_fail,
            n_ok: self.n_ok,
            broker_url: self.broker_url,
            store_path: self.store_path,
            auto_recovery_enabled: self.auto_recovery_enabled,
            recovery_timeout: Duration::from_secs(self.recovery_timeout_seconds),
            broker_consumer_workers: self.broker_consumer_workers,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_to_a_valid_config() {
        let cli = Cli::parse_from(["fleet-monitor"]);
        assert!(cli.into_config().is_ok());
    }

    #[test]
    fn zero_interval_fails_fast_at_boot() {
        let cli = Cli::parse_from(["fleet-monitor", "--ping-interval-seconds", "0"]);
        let err = cli.into_config().unwrap_err();
        assert!(err.to_string().contains("ping_interval"));
    }

    #[test]
    fn zero_n_fail_fails_fast_at_boot() {
        let cli = Cli::parse_from(["fleet-monitor", "--n-fail", "0"]);
        assert!(cli.into_config().is_err());
    }
}
