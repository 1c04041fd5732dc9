use std::time::Duration;

use async_trait::async_trait;
use rollout_observe::LineSink;
use tokio::process::Child;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    CommandSpec, ExecError, ExecResult, FollowEnd, ProcOutput, ProcessRunner,
    util::{cmd_program, kill_graceful, pipe_lines},
};

/// [`ProcessRunner`] backed by real OS processes (`tokio::process`).
#[derive(Clone, Debug)]
pub struct SystemRunner {
    /// Time a terminated child gets between SIGTERM and SIGKILL.
    kill_grace: Duration,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            kill_grace: Duration::from_secs(2),
        }
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    fn spawn(&self, cmd: &CommandSpec) -> ExecResult<Child> {
        if cmd.program.is_empty() {
            return Err(ExecError::MissingProgram);
        }
        trace!(target: "rollout.exec", program = %cmd.program, args = ?cmd.args, "spawn");
        cmd_program(&cmd.program, &cmd.args)
            .spawn()
            .map_err(|e| ExecError::from_spawn(&cmd.program, e))
    }

    async fn terminate(&self, child: &mut Child) {
        if let Err(e) = kill_graceful(child, self.kill_grace).await {
            warn!(target: "rollout.exec", error = %e, "failed to kill child");
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, cmd: &CommandSpec, deadline: Option<Instant>) -> ExecResult<ProcOutput> {
        let mut child = self.spawn(cmd)?;
        let mut lines = pipe_lines(&mut child);

        let collect = async {
            let mut output = String::new();
            while let Some(line) = lines.recv().await {
                output.push_str(&line);
                output.push('\n');
            }
            let status = child.wait().await?;
            Ok::<_, ExecError>(ProcOutput::new(status.code(), output))
        };

        let Some(deadline) = deadline else {
            return collect.await;
        };
        let res = tokio::time::timeout_at(deadline, collect).await;
        match res {
            Ok(out) => out,
            Err(_) => {
                debug!(target: "rollout.exec", command = %cmd, "deadline exceeded; killing child");
                self.terminate(&mut child).await;
                Err(ExecError::DeadlineExceeded)
            }
        }
    }

    async fn follow(
        &self,
        cmd: &CommandSpec,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> ExecResult<FollowEnd> {
        let mut child = self.spawn(cmd)?;
        let mut lines = pipe_lines(&mut child);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(target: "rollout.exec", command = %cmd, "cancelled; killing child");
                    self.terminate(&mut child).await;
                    return Ok(FollowEnd::Cancelled);
                }
                line = lines.recv() => match line {
                    Some(line) => sink.emit(&line),
                    None => break,
                },
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.terminate(&mut child).await;
                Ok(FollowEnd::Cancelled)
            }
            status = child.wait() => {
                let status = status?;
                debug!(target: "rollout.exec", command = %cmd, code = ?status.code(), "follow ended");
                Ok(FollowEnd::Exited { code: status.code() })
            }
        }
    }
}
