//! Per-container readiness state machine.
//!
//! ```text
//! START -> DETECT_POLICY -> WAIT_HEALTHY | WAIT_RUNNING
//!       -> SUCCESS | UNHEALTHY | TIMEOUT | UNKNOWN_STATUS
//! ```
//!
//! Containers are evaluated one after another; the first one that does not reach `SUCCESS`
//! ends the evaluation. Each status wait runs under its own deadline nested inside the run
//! deadline, and polls once per interval with a single inspect call.

pub mod policy;

use std::sync::Arc;
use std::time::Duration;

use rollout_exec::{ExecError, ProcessRunner};
use rollout_model::{ContainerRef, ContainerSet, HealthStatus, RunStatus, WaitPolicy};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use crate::{ComposeCli, HealthError};
use policy::{Transition, on_health, on_run, policy_from_probe};

#[derive(Clone)]
pub struct HealthMonitor {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli) -> Self {
        Self {
            runner,
            cli,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Budget of each container's status wait (capped by the caller's deadline).
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Evaluate every container in order, stopping at the first failure.
    pub async fn evaluate(
        &self,
        containers: &ContainerSet,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        for container in containers {
            self.evaluate_container(container, deadline, cancel).await?;
        }
        info!(target: "rollout.health", count = containers.len(), "all containers are ready");
        Ok(())
    }

    pub async fn evaluate_container(
        &self,
        container: &ContainerRef,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        let policy = self.detect_policy(container, deadline, cancel).await?;
        let nested = Instant::now()
            .checked_add(self.wait_timeout)
            .map_or(deadline, |own| deadline.min(own));
        self.wait_for(container, policy, nested, cancel).await
    }

    /// Decide whether to wait for `healthy` or for `running`.
    ///
    /// A failing inspect here only means the probe could not be confirmed, so the container
    /// falls back to run-status polling.
    pub async fn detect_policy(
        &self,
        container: &ContainerRef,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<WaitPolicy, HealthError> {
        let cmd = self.cli.inspect_probe(&container.runtime_id);
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(container)),
            _ = sleep_until(deadline) => None,
            res = self.runner.run(&cmd, Some(deadline)) => Some(res),
        };

        let policy = match res {
            Some(Ok(out)) if out.success() => policy_from_probe(out.trimmed()),
            other => {
                let reason = match other {
                    Some(Ok(out)) => out.trimmed().to_string(),
                    Some(Err(e)) => e.to_string(),
                    None => "deadline reached".to_string(),
                };
                warn!(
                    target: "rollout.health",
                    "error checking health status for container {container}: {reason}"
                );
                info!(
                    target: "rollout.health",
                    "note: declare a container health check to have readiness monitored properly, \
                     see https://docs.docker.com/reference/dockerfile/#healthcheck"
                );
                WaitPolicy::WaitRunning
            }
        };
        debug!(target: "rollout.health", container = %container, policy = ?policy, "policy detected");
        Ok(policy)
    }

    async fn wait_for(
        &self,
        container: &ContainerRef,
        policy: WaitPolicy,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), HealthError> {
        let cmd = match policy {
            WaitPolicy::WaitHealthy => self.cli.inspect_probe(&container.runtime_id),
            WaitPolicy::WaitRunning => self.cli.inspect_status(&container.runtime_id),
        };
        info!(
            target: "rollout.health",
            "checking {} status for container {container}...", policy.as_str()
        );

        loop {
            if Instant::now() >= deadline {
                return Err(timed_out(container, policy));
            }

            let res = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(container)),
                _ = sleep_until(deadline) => return Err(timed_out(container, policy)),
                res = self.runner.run(&cmd, Some(deadline)) => res,
            };
            let out = match res {
                Ok(out) if out.success() => out,
                Ok(out) => return Err(inspect_failed(container, out.trimmed())),
                Err(ExecError::DeadlineExceeded) => return Err(timed_out(container, policy)),
                Err(e) => return Err(inspect_failed(container, &e.to_string())),
            };

            let transition = match policy {
                WaitPolicy::WaitHealthy => {
                    let status = HealthStatus::parse(out.trimmed());
                    info!(target: "rollout.health", "container {container} health status: {status}");
                    on_health(&status)
                }
                WaitPolicy::WaitRunning => {
                    let status = RunStatus::parse(out.trimmed());
                    info!(target: "rollout.health", "container {container} status: {status}");
                    on_run(&status)
                }
            };
            match transition {
                Transition::Success => {
                    info!(target: "rollout.health", "container {container} is {}", policy.as_str());
                    return Ok(());
                }
                Transition::Unhealthy => {
                    return Err(HealthError::Unhealthy {
                        container: container.to_string(),
                    });
                }
                Transition::Unknown(status) => {
                    return Err(HealthError::UnknownStatus {
                        container: container.to_string(),
                        kind: status_kind(policy),
                        status,
                    });
                }
                Transition::Stay => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(container)),
                _ = sleep_until(deadline) => return Err(timed_out(container, policy)),
                _ = sleep(self.poll_interval) => {}
            }
        }
    }
}

fn status_kind(policy: WaitPolicy) -> &'static str {
    match policy {
        WaitPolicy::WaitHealthy => "health",
        WaitPolicy::WaitRunning => "run",
    }
}

fn timed_out(container: &ContainerRef, policy: WaitPolicy) -> HealthError {
    HealthError::Timeout {
        container: container.to_string(),
        expected: policy.as_str(),
    }
}

fn cancelled(container: &ContainerRef) -> HealthError {
    HealthError::Cancelled {
        container: container.to_string(),
    }
}

fn inspect_failed(container: &ContainerRef, reason: &str) -> HealthError {
    HealthError::Inspect {
        container: container.to_string(),
        reason: reason.to_string(),
    }
}
