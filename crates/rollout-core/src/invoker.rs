use std::sync::Arc;

use rollout_exec::ProcessRunner;
use tracing::{error, info};

use crate::{ComposeCli, Conflict, ConflictResolver, InvokeError, Resolution};

/// What a successful stack-up took.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BringUp {
    /// Number of stack-up invocations (1 or 2).
    pub attempts: u32,
    /// Container removed between the two attempts, if a retry happened.
    pub removed: Option<Conflict>,
}

/// Runs stack-up with at most one conflict-recovery retry.
#[derive(Clone)]
pub struct StackInvoker {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
    resolver: ConflictResolver,
}

impl StackInvoker {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli) -> Self {
        let resolver = ConflictResolver::new(Arc::clone(&runner), cli.clone());
        Self {
            runner,
            cli,
            resolver,
        }
    }

    /// Bring the stack up.
    ///
    /// On failure with `retry_allowed`, a recognized name conflict is resolved and stack-up is
    /// run once more with retries disabled; every other failure is returned as is.
    pub async fn bring_up(&self, force: bool, retry_allowed: bool) -> Result<BringUp, InvokeError> {
        let cmd = self.cli.up(force);
        let mut retry_allowed = retry_allowed;
        let mut removed = None;
        let mut attempts = 0;

        loop {
            attempts += 1;
            info!(target: "rollout.invoke", force, attempt = attempts, "starting stack");
            let out = self
                .runner
                .run(&cmd, None)
                .await
                .map_err(InvokeError::Launch)?;
            if out.success() {
                info!(target: "rollout.invoke", "stack is up");
                return Ok(BringUp { attempts, removed });
            }

            error!(target: "rollout.invoke", "error running stack up: {}", out.trimmed());
            if !retry_allowed {
                return Err(InvokeError::Failed {
                    output: out.output,
                    retried: removed.is_some(),
                });
            }
            match self.resolver.resolve(&out.output).await? {
                Resolution::Removed(conflict) => {
                    removed = Some(conflict);
                    retry_allowed = false;
                }
                Resolution::Unrecognized => {
                    return Err(InvokeError::Unrecognized { output: out.output });
                }
            }
        }
    }
}
