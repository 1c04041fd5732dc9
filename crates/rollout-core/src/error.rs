use std::path::PathBuf;

use rollout_exec::ExecError;
use rollout_model::OutcomeReason;
use thiserror::Error;

use crate::config::ConfigError;

/// Stack-up failures.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("could not launch stack up: {0}")]
    Launch(#[source] ExecError),
    /// Stack up failed and no retry was permitted (or the single retry also failed).
    #[error("stack up failed{}: {output}", retry_suffix(.retried))]
    Failed { output: String, retried: bool },
    /// Stack up failed with a message the conflict resolver does not recognize.
    #[error("stack up failed with an unrecognized error: {output}")]
    Unrecognized { output: String },
    #[error("failed to remove conflicting container {name} ({short_id}): {reason}")]
    RemoveFailed {
        name: String,
        short_id: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("listing stack containers: {0}")]
    List(#[source] ExecError),
    #[error("listing stack containers failed: {0}")]
    ListFailed(String),
    #[error("no containers found")]
    NoContainers,
    #[error("resolving name of container {id}: {reason}")]
    Resolve { id: String, reason: String },
}

/// Non-success terminal states of the health monitor.
///
/// `container` is the display form `name (short id)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("container {container} is unhealthy")]
    Unhealthy { container: String },
    #[error("container {container} has unknown {kind} status: {status}")]
    UnknownStatus {
        container: String,
        kind: &'static str,
        status: String,
    },
    #[error("timeout while waiting for container {container} to become {expected}")]
    Timeout {
        container: String,
        expected: &'static str,
    },
    #[error("error inspecting container {container}: {reason}")]
    Inspect { container: String, reason: String },
    #[error("health evaluation of container {container} was cancelled")]
    Cancelled { container: String },
}

impl HealthError {
    pub fn reason(&self) -> OutcomeReason {
        match self {
            HealthError::Unhealthy { .. } => OutcomeReason::Unhealthy,
            HealthError::UnknownStatus { .. } => OutcomeReason::UnknownStatus,
            HealthError::Timeout { .. } => OutcomeReason::Timeout,
            HealthError::Inspect { .. } => OutcomeReason::InspectFailed,
            HealthError::Cancelled { .. } => OutcomeReason::Cancelled,
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("log stream: {0}")]
    Exec(#[from] ExecError),
    #[error("log stream exited with {}", exit_desc(.code))]
    Exited { code: Option<i32> },
}

fn retry_suffix(retried: &bool) -> &'static str {
    if *retried { " after conflict retry" } else { "" }
}

fn exit_desc(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum HostsError {
    #[error("error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("{command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: ExecError,
    },
    #[error("{command} failed: {output}")]
    Failed { command: String, output: String },
}

/// Fatal conditions that abort a rollout before a health verdict exists.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("error getting containers: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),
    #[error("error updating hosts file: {0}")]
    Hosts(#[from] HostsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_messages() {
        let first = InvokeError::Failed {
            output: "boom".into(),
            retried: false,
        };
        assert_eq!(first.to_string(), "stack up failed: boom");
        let second = InvokeError::Failed {
            output: "boom".into(),
            retried: true,
        };
        assert_eq!(second.to_string(), "stack up failed after conflict retry: boom");
    }

    #[test]
    fn health_reasons() {
        let c = || "web (abcdef0123)".to_string();
        assert_eq!(HealthError::Unhealthy { container: c() }.reason(), OutcomeReason::Unhealthy);
        assert_eq!(
            HealthError::Timeout { container: c(), expected: "running" }.to_string(),
            "timeout while waiting for container web (abcdef0123) to become running"
        );
        assert_eq!(
            HealthError::Cancelled { container: c() }.reason(),
            OutcomeReason::Cancelled
        );
    }

    #[test]
    fn stream_exit_message() {
        assert_eq!(StreamError::Exited { code: Some(2) }.to_string(), "log stream exited with code 2");
        assert_eq!(StreamError::Exited { code: None }.to_string(), "log stream exited with a signal");
    }
}
