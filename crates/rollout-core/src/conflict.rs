//! Recovery from a stack-up that failed because a stale container still holds a name.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use rollout_exec::ProcessRunner;
use rollout_model::short_id;
use tracing::{info, warn};

use crate::{ComposeCli, InvokeError};

static CONFLICT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"container name "/([^"]+)" is already in use by container "([0-9a-fA-F]{12,})""#)
        .ok()
});

/// The container occupying a name the stack wants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Conflict {
    pub name: String,
    pub id: String,
}

impl Conflict {
    /// Extract the conflicting name and id from stack-up output, if the message is the
    /// engine's name-conflict error.
    pub fn parse(output: &str) -> Option<Self> {
        let caps = CONFLICT_PATTERN.as_ref()?.captures(output)?;
        Some(Self {
            name: caps[1].to_string(),
            id: caps[2].to_string(),
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// The conflicting container was force-removed.
    Removed(Conflict),
    /// The failure is not a name conflict; nothing was touched.
    Unrecognized,
}

#[derive(Clone)]
pub struct ConflictResolver {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
}

impl ConflictResolver {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli) -> Self {
        Self { runner, cli }
    }

    /// Remove the container named in a conflict message.
    ///
    /// A failed removal is an error; callers must not retry after it.
    pub async fn resolve(&self, output: &str) -> Result<Resolution, InvokeError> {
        let Some(conflict) = Conflict::parse(output) else {
            warn!(target: "rollout.conflict", "stack up failure is not a container name conflict");
            return Ok(Resolution::Unrecognized);
        };
        let short = short_id(&conflict.id).to_string();
        info!(
            target: "rollout.conflict",
            "trying to remove container [{}] with id [{}]", conflict.name, short
        );

        let removed = self.runner.run(&self.cli.remove(&conflict.id), None).await;
        let reason = match removed {
            Ok(out) if out.success() => None,
            Ok(out) => Some(out.trimmed().to_string()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            return Err(InvokeError::RemoveFailed {
                name: conflict.name,
                short_id: short,
                reason,
            });
        }

        info!(
            target: "rollout.conflict",
            "container [{}] with id [{}] removed", conflict.name, short
        );
        Ok(Resolution::Removed(conflict))
    }
}
