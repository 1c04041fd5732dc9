use std::sync::Arc;

use rollout_exec::ProcessRunner;
use rollout_model::{ContainerSet, DeploymentOutcome, OutcomeReason, short_id};
use rollout_observe::LineSink;
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::deadline_after;
use crate::{
    ContainerDiscovery, DeployError, HealthError, HealthMonitor, LogStreamer, RolloutConfig,
    StackInvoker, StreamEnd, StreamError,
};

/// Drives one rollout: stack-up, discovery, then the health/log race.
pub struct Coordinator {
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn LineSink>,
    config: RolloutConfig,
}

impl Coordinator {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn LineSink>,
        config: RolloutConfig,
    ) -> Self {
        Self {
            runner,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &RolloutConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<DeploymentOutcome, DeployError> {
        self.run_with_cancel(CancellationToken::new()).await
    }

    /// Like [`run`](Self::run); cancelling `shutdown` stops both racing tasks and yields a
    /// `Cancelled` outcome.
    pub async fn run_with_cancel(
        &self,
        shutdown: CancellationToken,
    ) -> Result<DeploymentOutcome, DeployError> {
        let cli = &self.config.cli;

        let up = StackInvoker::new(Arc::clone(&self.runner), cli.clone())
            .bring_up(self.config.force, true)
            .await?;
        if let Some(conflict) = &up.removed {
            info!(
                target: "rollout.coordinator",
                attempts = up.attempts,
                "stack up after removing container {} ({})",
                conflict.name,
                short_id(&conflict.id)
            );
        }

        let containers = ContainerDiscovery::new(Arc::clone(&self.runner), cli.clone())
            .list_stack_containers()
            .await?;

        let budget = self.config.run_budget();
        info!(
            target: "rollout.coordinator",
            budget = ?budget,
            "waiting for {} container(s)",
            containers.len()
        );
        let deadline = deadline_after(budget);

        Ok(self.race(Arc::new(containers), deadline, &shutdown).await)
    }

    async fn race(
        &self,
        containers: Arc<ContainerSet>,
        deadline: Instant,
        shutdown: &CancellationToken,
    ) -> DeploymentOutcome {
        let monitor = HealthMonitor::new(Arc::clone(&self.runner), self.config.cli.clone())
            .with_poll_interval(self.config.poll_interval)
            .with_wait_timeout(self.config.wait_timeout());
        let streamer = LogStreamer::new(
            Arc::clone(&self.runner),
            self.config.cli.clone(),
            Arc::clone(&self.sink),
        )
        .with_settle_delay(self.config.settle_delay);

        let health_token = shutdown.child_token();
        let logs_token = shutdown.child_token();
        // Both tasks stop with this future, even when it is dropped before the race ends.
        let _health_guard = health_token.clone().drop_guard();
        let _logs_guard = logs_token.clone().drop_guard();

        let mut health = tokio::spawn({
            let token = health_token.clone();
            async move { monitor.evaluate(&containers, deadline, &token).await }
        });
        let mut logs = tokio::spawn({
            let token = logs_token.clone();
            async move { streamer.stream(deadline, &token).await }
        });

        let verdict = tokio::select! {
            biased;
            res = &mut health => {
                logs_token.cancel();
                report_stream(logs.await);
                res
            }
            res = &mut logs => {
                // At the run deadline the monitor is already past its own and settles by itself.
                let expired = matches!(res, Ok(Ok(StreamEnd::DeadlineReached)));
                report_stream(res);
                if !expired {
                    debug!(
                        target: "rollout.coordinator",
                        "log stream finished first, stopping health evaluation"
                    );
                    health_token.cancel();
                }
                health.await
            }
        };

        outcome_from(verdict)
    }
}

fn report_stream(res: Result<Result<StreamEnd, StreamError>, JoinError>) {
    match res {
        Ok(Ok(end)) => debug!(target: "rollout.coordinator", end = ?end, "log stream finished"),
        Ok(Err(e)) => warn!(target: "rollout.coordinator", "error streaming logs: {e}"),
        Err(e) => warn!(target: "rollout.coordinator", "log stream task failed: {e}"),
    }
}

fn outcome_from(verdict: Result<Result<(), HealthError>, JoinError>) -> DeploymentOutcome {
    match verdict {
        Ok(Ok(())) => {
            info!(target: "rollout.coordinator", "deployment is ready");
            DeploymentOutcome::ready()
        }
        Ok(Err(e)) => {
            error!(target: "rollout.coordinator", "{e}");
            DeploymentOutcome::failed(e.reason(), e.to_string())
        }
        Err(e) => {
            error!(target: "rollout.coordinator", "health task failed: {e}");
            DeploymentOutcome::failed(OutcomeReason::Cancelled, format!("health task failed: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{Reply, ScriptedRunner};
    use crate::{ComposeCli, DiscoveryError, InvokeError};
    use rollout_observe::MemorySink;

    const ID: &str = "abcdef0123456789";

    fn cli() -> ComposeCli {
        ComposeCli::default()
    }

    /// A one-container stack that comes up on the first attempt.
    fn stack(runner: &ScriptedRunner) {
        runner.on(&cli().up(false), [Reply::ok("")]);
        runner.on(&cli().list_ids(), [Reply::ok(&format!("{ID}\n"))]);
        runner.on(&cli().inspect_name(ID), [Reply::ok("/web\n")]);
    }

    fn coordinator(
        runner: &ScriptedRunner,
        sink: &MemorySink,
        config: RolloutConfig,
    ) -> Coordinator {
        Coordinator::new(Arc::new(runner.clone()), Arc::new(sink.clone()), config)
    }

    fn config() -> RolloutConfig {
        RolloutConfig::new(cli())
    }

    #[tokio::test(start_paused = true)]
    async fn ready_stack_is_ok() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("starting"), Reply::ok("healthy")]);
        runner.on_follow(&cli().logs_follow(), &["web-1 | up"], None);

        let outcome = coordinator(&runner, &MemorySink::new(), config())
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, DeploymentOutcome::ready());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stack_logs_reach_the_sink() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(
            &cli().inspect_probe(ID),
            [Reply::ok("starting"), Reply::ok("starting"), Reply::ok("healthy")],
        );
        runner.on_follow(&cli().logs_follow(), &["web-1 | booting", "web-1 | up"], None);
        let sink = MemorySink::new();

        let outcome = coordinator(&runner, &sink, config()).run().await.unwrap();

        assert!(outcome.ok);
        assert_eq!(sink.lines(), vec!["web-1 | booting", "web-1 | up"]);
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_is_recovered_before_racing() {
        let runner = ScriptedRunner::new();
        let conflict = "Error response from daemon: Conflict. The container name \"/web\" \
                        is already in use by container \"0123456789abcdef\".";
        runner.on(&cli().up(false), [Reply::exit(1, conflict), Reply::ok("")]);
        runner.on(&cli().remove("0123456789abcdef"), [Reply::ok("0123456789abcdef")]);
        runner.on(&cli().list_ids(), [Reply::ok(ID)]);
        runner.on(&cli().inspect_name(ID), [Reply::ok("/web")]);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("<no value>")]);
        runner.on(&cli().inspect_status(ID), [Reply::ok("running")]);
        runner.on_follow(&cli().logs_follow(), &[], None);

        let outcome = coordinator(&runner, &MemorySink::new(), config())
            .run()
            .await
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(runner.count(&cli().up(false)), 2);
        assert_eq!(runner.count(&cli().remove("0123456789abcdef")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn force_recreate_is_passed_to_stack_up() {
        let runner = ScriptedRunner::new();
        runner.on(&cli().up(true), [Reply::ok("")]);
        runner.on(&cli().list_ids(), [Reply::ok(ID)]);
        runner.on(&cli().inspect_name(ID), [Reply::ok("/web")]);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("healthy")]);
        runner.on_follow(&cli().logs_follow(), &[], None);

        let outcome = coordinator(&runner, &MemorySink::new(), config().with_force(true))
            .run()
            .await
            .unwrap();

        assert!(outcome.ok);
        assert_eq!(runner.count(&cli().up(false)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_container_fails_the_rollout() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("starting"), Reply::ok("unhealthy")]);
        runner.on_follow(&cli().logs_follow(), &[], None);

        let outcome = coordinator(&runner, &MemorySink::new(), config())
            .run()
            .await
            .unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.reason, OutcomeReason::Unhealthy);
        assert_eq!(outcome.detail.as_deref(), Some("container web (abcdef0123) is unhealthy"));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn log_stream_ending_first_is_not_success() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("<no value>")]);
        runner.on(&cli().inspect_status(ID), [Reply::ok("created")]);
        runner.on_follow(&cli().logs_follow(), &["web-1 | exiting"], Some(0));
        let mut config = config();
        config.settle_delay = Duration::ZERO;

        let outcome = coordinator(&runner, &MemorySink::new(), config)
            .run()
            .await
            .unwrap();

        assert!(!outcome.ok);
        assert_eq!(outcome.reason, OutcomeReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_timeout_bounds_the_wait() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("<no value>")]);
        runner.on(&cli().inspect_status(ID), [Reply::ok("restarting")]);
        runner.on_follow(&cli().logs_follow(), &[], None);
        let config = config().with_timeout(Some(Duration::from_secs(30)));
        let start = Instant::now();

        let outcome = coordinator(&runner, &MemorySink::new(), config)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.reason, OutcomeReason::Timeout);
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_race() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("starting")]);
        runner.on_follow(&cli().logs_follow(), &[], None);
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(12)).await;
            trigger.cancel();
        });

        let outcome = coordinator(&runner, &MemorySink::new(), config())
            .run_with_cancel(shutdown)
            .await
            .unwrap();

        assert_eq!(outcome.reason, OutcomeReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_stack_up_is_fatal() {
        let runner = ScriptedRunner::new();
        runner.on(
            &cli().up(false),
            [Reply::exit(1, "yaml: line 3: mapping values are not allowed")],
        );

        let res = coordinator(&runner, &MemorySink::new(), config()).run().await;

        assert!(matches!(res, Err(DeployError::Invoke(InvokeError::Unrecognized { .. }))));
        assert_eq!(runner.count(&cli().list_ids()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_stack_is_fatal() {
        let runner = ScriptedRunner::new();
        runner.on(&cli().up(false), [Reply::ok("")]);
        runner.on(&cli().list_ids(), [Reply::ok("")]);

        let res = coordinator(&runner, &MemorySink::new(), config()).run().await;

        assert!(matches!(res, Err(DeployError::Discovery(DiscoveryError::NoContainers))));
        assert_eq!(runner.count(&cli().logs_follow()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_does_not_overflow_the_deadline() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("<no value>")]);
        runner.on(&cli().inspect_status(ID), [Reply::ok("created"), Reply::ok("running")]);
        runner.on_follow(&cli().logs_follow(), &[], None);
        let config = config().with_timeout(Some(Duration::from_secs(u64::MAX)));

        let outcome = coordinator(&runner, &MemorySink::new(), config)
            .run()
            .await
            .unwrap();

        assert!(outcome.ok);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_run_stops_polling() {
        let runner = ScriptedRunner::new();
        stack(&runner);
        runner.on(&cli().inspect_probe(ID), [Reply::ok("<no value>")]);
        runner.on(&cli().inspect_status(ID), [Reply::ok("created")]);
        runner.on_follow(&cli().logs_follow(), &[], None);
        let coordinator = coordinator(&runner, &MemorySink::new(), config());

        let res = tokio::time::timeout(Duration::from_secs(20), coordinator.run()).await;
        assert!(res.is_err());
        let polls = runner.count(&cli().inspect_status(ID));
        assert!(polls > 0);

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(runner.count(&cli().inspect_status(ID)), polls);
        assert_eq!(runner.count(&cli().logs_follow()), 1);
    }

}
