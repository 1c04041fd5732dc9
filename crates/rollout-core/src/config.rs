use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::ComposeCli;

/// Wait budget used when no timeout is configured (or the configured one cannot be read).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3000 * 60);
/// Added on top of a configured timeout to form the run deadline.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Pause before attaching to the log stream so freshly started containers have output.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid timeout {0:?} (expected whole seconds, optional `s` suffix)")]
    InvalidTimeout(String),
    #[error("invalid flag value {0:?} (expected true, false, 1 or 0)")]
    InvalidFlag(String),
    #[error("invalid address {0:?}")]
    InvalidAddress(String),
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Parse `"90"` or `"90s"` into a duration.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    digits
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}

/// `true`/`1` are set, `false`/`0`/empty are unset; anything else is rejected.
pub fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(raw.to_string())),
    }
}

/// `now + budget`; a budget too large for the clock falls back to [`DEFAULT_TIMEOUT`].
pub fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget).unwrap_or(now + DEFAULT_TIMEOUT)
}

/// Everything one rollout needs to know.
#[derive(Debug, Clone)]
pub struct RolloutConfig {
    pub cli: ComposeCli,
    /// Operator-supplied wait budget; `None` means [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
    /// Recreate containers even when their configuration is unchanged.
    pub force: bool,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub safety_margin: Duration,
    pub default_timeout: Duration,
}

impl RolloutConfig {
    pub fn new(cli: ComposeCli) -> Self {
        Self {
            cli,
            timeout: None,
            force: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            safety_margin: SAFETY_MARGIN,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Budget of the whole health/log race.
    pub fn run_budget(&self) -> Duration {
        match self.timeout {
            Some(t) => t.saturating_add(self.safety_margin),
            None => self.default_timeout,
        }
    }

    /// Budget of each container's status wait; always within [`run_budget`](Self::run_budget).
    pub fn wait_timeout(&self) -> Duration {
        self.timeout.unwrap_or(self.default_timeout)
    }
}
