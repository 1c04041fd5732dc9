use async_trait::async_trait;
use rollout_observe::LineSink;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{CommandSpec, ExecResult, FollowEnd, ProcOutput};

/// The single primitive used to talk to the container engine and compose tooling.
///
/// Implementations never interpret the output; callers decide what a non-zero exit or a
/// particular message means.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and capture stdout and stderr combined.
    ///
    /// With a `deadline`, a process still running when it passes is terminated and
    /// [`ExecError::DeadlineExceeded`](crate::ExecError::DeadlineExceeded) is returned.
    async fn run(&self, cmd: &CommandSpec, deadline: Option<Instant>) -> ExecResult<ProcOutput>;

    /// Run and forward every output line to `sink` as it arrives.
    ///
    /// Returns when the output ends and the process exits, or when `cancel` fires (the process
    /// is killed first).
    async fn follow(
        &self,
        cmd: &CommandSpec,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> ExecResult<FollowEnd>;
}
