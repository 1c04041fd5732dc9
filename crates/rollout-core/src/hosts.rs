//! Name resolution entry for the remote engine host.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::HostsError;

/// Host name the stack definitions use to reach the engine.
pub const DOCKER_SERVER_HOST: &str = "docker-server";
pub const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HostsUpdate {
    Added,
    AlreadyPresent,
}

#[derive(Clone, Debug)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `<ip> docker-server` unless that exact line is already there.
    pub fn ensure_entry(&self, ip: IpAddr) -> Result<HostsUpdate, HostsError> {
        let entry = format!("{ip} {DOCKER_SERVER_HOST}");
        let content = fs::read_to_string(&self.path).map_err(|source| HostsError::Read {
            path: self.path.clone(),
            source,
        })?;

        if content.lines().any(|line| line.trim() == entry) {
            info!(target: "rollout.hosts", path = %self.path.display(), "entry already exists");
            return Ok(HostsUpdate::AlreadyPresent);
        }

        let mut addition = String::new();
        if !content.is_empty() && !content.ends_with('\n') {
            addition.push('\n');
        }
        addition.push_str(&entry);
        addition.push('\n');

        let write_err = |source: std::io::Error| HostsError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        file.write_all(addition.as_bytes()).map_err(write_err)?;

        info!(target: "rollout.hosts", path = %self.path.display(), "added entry {entry}");
        Ok(HostsUpdate::Added)
    }
}

impl Default for HostsFile {
    fn default() -> Self {
        Self::new(DEFAULT_HOSTS_PATH)
    }
}
