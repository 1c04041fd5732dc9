use std::sync::Arc;

use rollout_exec::ProcessRunner;
use rollout_model::{ContainerRef, ContainerSet};
use tracing::{info, warn};

use crate::{ComposeCli, DiscoveryError};

/// Resolves the stack's containers to `(logical name, runtime id)` pairs.
#[derive(Clone)]
pub struct ContainerDiscovery {
    runner: Arc<dyn ProcessRunner>,
    cli: ComposeCli,
}

impl ContainerDiscovery {
    pub fn new(runner: Arc<dyn ProcessRunner>, cli: ComposeCli) -> Self {
        Self { runner, cli }
    }

    /// All-or-nothing: an empty listing or any failed name lookup is an error.
    pub async fn list_stack_containers(&self) -> Result<ContainerSet, DiscoveryError> {
        let listing = self
            .runner
            .run(&self.cli.list_ids(), None)
            .await
            .map_err(DiscoveryError::List)?;
        if !listing.success() {
            return Err(DiscoveryError::ListFailed(listing.trimmed().to_string()));
        }

        let ids: Vec<&str> = listing
            .output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if ids.is_empty() {
            return Err(DiscoveryError::NoContainers);
        }

        let mut containers = ContainerSet::new();
        for id in ids {
            let name = self.resolve_name(id).await?;
            let container = ContainerRef::new(name, id);
            info!(target: "rollout.discovery", "container {container} started");
            if !containers.insert(container) {
                warn!(target: "rollout.discovery", id, "container listed twice; ignoring duplicate");
            }
        }
        Ok(containers)
    }

    async fn resolve_name(&self, id: &str) -> Result<String, DiscoveryError> {
        let resolve_err = |reason: String| DiscoveryError::Resolve {
            id: id.to_string(),
            reason,
        };
        let out = self
            .runner
            .run(&self.cli.inspect_name(id), None)
            .await
            .map_err(|e| resolve_err(e.to_string()))?;
        if !out.success() {
            return Err(resolve_err(out.trimmed().to_string()));
        }
        let name = out.trimmed();
        if name.is_empty() || name == "/" {
            return Err(resolve_err("engine returned an empty name".to_string()));
        }
        Ok(name.to_string())
    }
}
