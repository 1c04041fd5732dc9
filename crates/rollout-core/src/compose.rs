use std::path::{Path, PathBuf};

use rollout_exec::CommandSpec;

/// Argument shapes of every engine/compose call the rollout issues.
#[derive(Clone, Debug)]
pub struct ComposeCli {
    compose_program: String,
    compose_prefix: Vec<String>,
    docker_program: String,
    file: PathBuf,
}

impl ComposeCli {
    /// `compose` may carry leading arguments, e.g. `"docker compose"`.
    pub fn new(compose: &str, docker: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        let mut parts = compose.split_whitespace().map(str::to_string);
        let compose_program = parts.next().unwrap_or_else(|| "docker-compose".to_string());
        Self {
            compose_program,
            compose_prefix: parts.collect(),
            docker_program: docker.into(),
            file: file.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    fn compose(&self) -> CommandSpec {
        CommandSpec::new(&self.compose_program)
            .args(self.compose_prefix.iter().cloned())
            .arg("-f")
            .arg(self.file.to_string_lossy())
    }

    fn docker(&self) -> CommandSpec {
        CommandSpec::new(&self.docker_program)
    }

    pub fn up(&self, force: bool) -> CommandSpec {
        let cmd = self.compose().args(["up", "-d"]);
        if force { cmd.arg("--force-recreate") } else { cmd }
    }

    pub fn list_ids(&self) -> CommandSpec {
        self.compose().args(["ps", "-q"])
    }

    pub fn logs_follow(&self) -> CommandSpec {
        self.compose().args(["logs", "-f"])
    }

    pub fn pull(&self) -> CommandSpec {
        self.compose().arg("pull")
    }

    pub fn inspect_name(&self, id: &str) -> CommandSpec {
        self.docker().args(["inspect", "--format={{.Name}}", id])
    }

    pub fn inspect_probe(&self, id: &str) -> CommandSpec {
        self.docker()
            .args(["inspect", "--format={{.State.Health.Status}}", id])
    }

    pub fn inspect_status(&self, id: &str) -> CommandSpec {
        self.docker().args(["inspect", "--format={{.State.Status}}", id])
    }

    pub fn remove(&self, id: &str) -> CommandSpec {
        self.docker().args(["rm", "-f", id])
    }

    pub fn prune(&self) -> CommandSpec {
        self.docker().args(["system", "prune", "-f"])
    }
}

impl Default for ComposeCli {
    fn default() -> Self {
        Self::new("docker-compose", "docker", "docker-compose.yaml")
    }
}
