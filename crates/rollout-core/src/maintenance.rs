use std::sync::Arc;

use rollout_exec::{CommandSpec, ProcessRunner};
use tracing::{debug, error, info};

use crate::{ComposeCli, MaintenanceError};

/// Housekeeping around a rollout: image pulls and engine pruning.
#[derive(Clone)]
pub struct Maintenance {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
}

impl Maintenance {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli) -> Self {
        Self { runner, cli }
    }

    /// Drop stopped containers, dangling images and unused networks.
    pub async fn prune(&self) -> Result<(), MaintenanceError> {
        self.exec(self.cli.prune()).await
    }

    /// Fetch the images the stack references.
    pub async fn pull(&self) -> Result<(), MaintenanceError> {
        self.exec(self.cli.pull()).await
    }

    async fn exec(&self, cmd: CommandSpec) -> Result<(), MaintenanceError> {
        let command = cmd.to_string();
        info!(target: "rollout.maintenance", "running {command}...");

        let out = self
            .runner
            .run(&cmd, None)
            .await
            .map_err(|source| MaintenanceError::Launch {
                command: command.clone(),
                source,
            })?;
        if !out.success() {
            error!(target: "rollout.maintenance", "{command}: {}", out.trimmed());
            return Err(MaintenanceError::Failed {
                command,
                output: out.trimmed().to_string(),
            });
        }

        debug!(target: "rollout.maintenance", output = out.trimmed(), "{command} output");
        info!(target: "rollout.maintenance", "{command} completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedRunner};

    fn maintenance(runner: &ScriptedRunner) -> Maintenance {
        Maintenance::new(Arc::new(runner.clone()), ComposeCli::default())
    }

    #[tokio::test]
    async fn prune_runs_engine_prune() {
        let runner = ScriptedRunner::new();
        runner.on(&ComposeCli::default().prune(), [Reply::ok("Total reclaimed space: 0B")]);

        maintenance(&runner).prune().await.unwrap();

        assert_eq!(runner.calls(), vec!["docker system prune -f"]);
    }

    #[tokio::test]
    async fn pull_uses_the_stack_file() {
        let runner = ScriptedRunner::new();
        runner.on(&ComposeCli::default().pull(), [Reply::ok("")]);

        maintenance(&runner).pull().await.unwrap();

        assert_eq!(
            runner.calls(),
            vec!["docker-compose -f docker-compose.yaml pull"]
        );
    }

    #[tokio::test]
    async fn failed_pull_reports_output() {
        let runner = ScriptedRunner::new();
        runner.on(
            &ComposeCli::default().pull(),
            [Reply::exit(1, "pull access denied for acme/web\n")],
        );

        let err = maintenance(&runner).pull().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "docker-compose -f docker-compose.yaml pull failed: pull access denied for acme/web"
        );
    }

    #[tokio::test]
    async fn launch_failure_is_reported() {
        let runner = ScriptedRunner::new();

        let err = maintenance(&runner).prune().await.unwrap_err();

        assert!(matches!(err, MaintenanceError::Launch { .. }));
    }
}
