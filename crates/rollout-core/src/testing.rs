//! Scripted stand-in for the container engine.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rollout_exec::{CommandSpec, ExecError, ExecResult, FollowEnd, ProcOutput, ProcessRunner};
use rollout_observe::LineSink;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub enum Reply {
    Ok(String),
    Exit(i32, String),
    /// Launch failure with the given message.
    Error(String),
    /// Never answers.
    Hang,
}

impl Reply {
    pub fn ok(output: &str) -> Self {
        Reply::Ok(output.to_string())
    }

    pub fn exit(code: i32, output: &str) -> Self {
        Reply::Exit(code, output.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct FollowScript {
    pub lines: Vec<String>,
    /// `Some(code)` exits after the lines, `None` keeps streaming until cancelled.
    pub exit: Option<i32>,
}

#[derive(Default)]
struct Inner {
    /// Replies are consumed in order; the last one repeats.
    replies: HashMap<String, VecDeque<Reply>>,
    follow: HashMap<String, FollowScript>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, cmd: &CommandSpec, replies: impl IntoIterator<Item = Reply>) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .entry(cmd.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn on_follow(&self, cmd: &CommandSpec, lines: &[&str], exit: Option<i32>) -> &Self {
        let script = FollowScript {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            exit,
        };
        self.inner
            .lock()
            .unwrap()
            .follow
            .insert(cmd.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, cmd: &CommandSpec) -> usize {
        let needle = cmd.to_string();
        self.calls().iter().filter(|c| **c == needle).count()
    }

    fn next_reply(&self, cmd: &CommandSpec) -> Option<Reply> {
        let key = cmd.to_string();
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(key.clone());
        let queue = inner.replies.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, cmd: &CommandSpec, _deadline: Option<Instant>) -> ExecResult<ProcOutput> {
        match self.next_reply(cmd) {
            None => Err(ExecError::NotFound(format!("unscripted command: {cmd}"))),
            Some(Reply::Ok(out)) => Ok(ProcOutput::new(Some(0), out)),
            Some(Reply::Exit(code, out)) => Ok(ProcOutput::new(Some(code), out)),
            Some(Reply::Error(msg)) => Err(ExecError::Spawn(msg)),
            Some(Reply::Hang) => std::future::pending().await,
        }
    }

    async fn follow(
        &self,
        cmd: &CommandSpec,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> ExecResult<FollowEnd> {
        let script = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(cmd.to_string());
            inner.follow.get(&cmd.to_string()).cloned()
        };
        let Some(script) = script else {
            return Err(ExecError::NotFound(format!("unscripted command: {cmd}")));
        };
        for line in &script.lines {
            if cancel.is_cancelled() {
                return Ok(FollowEnd::Cancelled);
            }
            sink.emit(line);
        }
        match script.exit {
            Some(code) => Ok(FollowEnd::Exited { code: Some(code) }),
            None => {
                cancel.cancelled().await;
                Ok(FollowEnd::Cancelled)
            }
        }
    }
}
