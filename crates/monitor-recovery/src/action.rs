//! Restart action abstraction — a direct translation of
//! `restart_container`/`restart_service` from the original recovery module,
//! generalized into an injectable trait so tests don't need real Docker.

use async_trait::async_trait;
use std::time::Duration;

/// Result of one restart attempt, mirroring the original's result dict
/// shape (`success`, `container`, `action`, `message`/`error`).
#[derive(Debug, Clone)]
pub struct RestartOutcome {
    /// Whether the restart command completed successfully.
    pub success: bool,
    /// Container that was targeted.
    pub container: String,
    /// Human-readable success detail.
    pub message: Option<String>,
    /// Human-readable failure detail (stderr, or the failure reason).
    pub error: Option<String>,
}

/// Pluggable container restart mechanism.
#[async_trait]
pub trait RestartAction: Send + Sync {
    /// Restart `container`, bounded by `timeout`. Never panics — every
    /// failure mode (process spawn failure, non-zero exit, deadline
    /// elapsed) is captured in the returned [`RestartOutcome`].
    async fn restart(&self, container: &str, timeout: Duration) -> RestartOutcome;
}

/// Shells out to `docker restart --time <timeout> <container>`, a direct
/// translation of `restart_container`.
pub struct DockerCliRestartAction;

#[async_trait]
impl RestartAction for DockerCliRestartAction {
    async fn restart(&self, container: &str, timeout: Duration) -> RestartOutcome {
        let timeout_secs = timeout.as_secs().max(1).to_string();
        let mut command = tokio::process::Command::new("docker");
        command.args(["restart", "--time", &timeout_secs, container]);

        // The original gives the subprocess call a 10s grace period beyond
        // docker's own --time budget before declaring it hung.
        let wait_budget = timeout + Duration::from_secs(10);

        match tokio::time::timeout(wait_budget, command.output()).await {
            Err(_elapsed) => RestartOutcome {
                success: false,
                container: container.to_string(),
                message: None,
                error: Some("timeout expired".to_string()),
            },
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => RestartOutcome {
                success: false,
                container: container.to_string(),
                message: None,
                error: Some("docker CLI not found".to_string()),
            },
            Ok(Err(e)) => RestartOutcome {
                success: false,
                container: container.to_string(),
                message: None,
                error: Some(e.to_string()),
            },
            Ok(Ok(output)) if output.status.success() => RestartOutcome {
                success: true,
                container: container.to_string(),
                message: Some(format!("container {container} restarted")),
                error: None,
            },
            Ok(Ok(output)) => RestartOutcome {
                success: false,
                container: container.to_string(),
                message: None,
                error: Some(String::from_utf8_lossy(&output.stderr).trim().to_string()),
            },
        }
    }
}
