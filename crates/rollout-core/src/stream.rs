use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use rollout_exec::{FollowEnd, ProcessRunner};
use rollout_observe::LineSink;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DEFAULT_SETTLE_DELAY;
use crate::{ComposeCli, StreamError};

/// Why a log stream ended without an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamEnd {
    /// The stack's output ended and the follow process exited cleanly.
    Eof,
    Cancelled,
    /// The run deadline passed; the follow process was stopped.
    DeadlineReached,
}

/// Forwards the stack's combined output to a [`LineSink`].
#[derive(Clone)]
pub struct LogStreamer {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
    sink: Arc<dyn LineSink>,
    settle: Duration,
}

impl LogStreamer {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli, sink: Arc<dyn LineSink>) -> Self {
        Self {
            runner,
            cli,
            sink,
            settle: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Pause before attaching; zero attaches immediately.
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Follow the stack's logs until they end, `cancel` fires, or `deadline` passes.
    pub async fn stream(
        &self,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, StreamError> {
        if !self.settle.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                _ = sleep_until(deadline) => return Ok(StreamEnd::DeadlineReached),
                _ = sleep(self.settle) => {}
            }
        }

        let cmd = self.cli.logs_follow();
        info!(target: "rollout.stream", "following stack logs");

        // Stopped either by the caller or by the deadline below.
        let stop = cancel.child_token();
        let mut follow = pin!(self.runner.follow(&cmd, self.sink.as_ref(), &stop));
        let (end, expired) = tokio::select! {
            res = &mut follow => (res?, false),
            _ = sleep_until(deadline) => {
                debug!(target: "rollout.stream", "deadline reached, stopping log stream");
                stop.cancel();
                (follow.await?, true)
            }
        };

        match end {
            _ if expired => Ok(StreamEnd::DeadlineReached),
            FollowEnd::Cancelled => Ok(StreamEnd::Cancelled),
            FollowEnd::Exited { code: Some(0) } => {
                info!(target: "rollout.stream", "log stream ended");
                Ok(StreamEnd::Eof)
            }
            FollowEnd::Exited { code } => Err(StreamError::Exited { code }),
        }
    }
}
