use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rollout_core::hosts::DEFAULT_HOSTS_PATH;
use rollout_core::{ComposeCli, ConfigError, RolloutConfig, parse_flag, parse_timeout};
use rollout_observe::{LoggerConfig, LoggerFormat, LoggerLevel};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeployMode {
    /// Engine runs on this host.
    Local,
    /// Engine runs on the host named by `DOCKER_SERVER_IP`.
    Remote,
}

/// Bring a compose stack up and wait until every container is ready.
#[derive(Parser, Debug)]
#[command(name = "rollout", version)]
pub struct Args {
    /// Stack definition to deploy.
    #[arg(long, env = "DOCKER_COMPOSE_FILE", value_name = "FILE")]
    pub compose_file: Option<PathBuf>,

    /// Wait budget in seconds (`90` or `90s`).
    #[arg(long, env = "TIMEOUT")]
    pub timeout: Option<String>,

    /// Recreate containers even if unchanged (`true`, `false`, `1`, `0`).
    #[arg(long, env = "FORCE")]
    pub force: Option<String>,

    /// Address of the engine host, written to the hosts file as `docker-server`.
    #[arg(long, env = "DOCKER_SERVER_IP")]
    pub server_ip: Option<String>,

    #[arg(long, env = "DEPLOY_MODE", value_enum, default_value_t = DeployMode::Local)]
    pub mode: DeployMode,

    #[arg(long, env = "COMPOSE_BIN", default_value = "docker-compose")]
    pub compose_bin: String,

    #[arg(long, env = "DOCKER_BIN", default_value = "docker")]
    pub docker_bin: String,

    #[arg(long, env = "HOSTS_FILE", default_value = DEFAULT_HOSTS_PATH)]
    pub hosts_file: PathBuf,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LoggerLevel,

    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// Do not pull images before stack-up.
    #[arg(long, env = "SKIP_PULL")]
    pub skip_pull: bool,

    /// Do not prune the engine before and after the rollout.
    #[arg(long, env = "SKIP_PRUNE")]
    pub skip_prune: bool,
}

/// Validated inputs of one rollout.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: RolloutConfig,
    /// Set when a hosts entry must be ensured.
    pub server_ip: Option<IpAddr>,
    pub hosts_file: PathBuf,
    pub skip_pull: bool,
    pub skip_prune: bool,
}

impl Args {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..LoggerConfig::default()
        }
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let file = self
            .compose_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::Missing("DOCKER_COMPOSE_FILE"))?;

        let force = match self.force.as_deref() {
            Some(raw) => parse_flag(raw)?,
            None => false,
        };

        let server_ip = match self.server_ip.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                raw.parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidAddress(raw.to_string()))?,
            ),
            _ => None,
        };
        if self.mode == DeployMode::Remote && server_ip.is_none() {
            return Err(ConfigError::Missing("DOCKER_SERVER_IP"));
        }

        let cli = ComposeCli::new(&self.compose_bin, self.docker_bin.clone(), file);
        let config = RolloutConfig::new(cli)
            .with_timeout(self.wait_budget())
            .with_force(force);

        Ok(Settings {
            config,
            server_ip,
            hosts_file: self.hosts_file.clone(),
            skip_pull: self.skip_pull,
            skip_prune: self.skip_prune,
        })
    }

    /// An unreadable timeout falls back to the default budget.
    fn wait_budget(&self) -> Option<Duration> {
        let raw = self.timeout.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        match parse_timeout(raw) {
            Ok(timeout) => Some(timeout),
            Err(e) => {
                warn!(target: "rollout.cli", "{e}, using the default timeout");
                None
            }
        }
    }
}

impl Settings {
    pub fn compose_file(&self) -> &Path {
        self.config.cli.file()
    }
}
