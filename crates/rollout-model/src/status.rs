use std::fmt;

use serde::{Deserialize, Serialize};

/// Probe status reported by the engine for a container that declares a health check.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Starting,
    /// Anything the engine reported that is not one of the above (kept verbatim).
    Unrecognized(String),
}

impl HealthStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "healthy" => HealthStatus::Healthy,
            "unhealthy" => HealthStatus::Unhealthy,
            "starting" => HealthStatus::Starting,
            other => HealthStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Starting => "starting",
            HealthStatus::Unrecognized(raw) => raw,
        }
    }
}

/// Lifecycle status reported by the engine, independent of any probe.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Running,
    Created,
    Restarting,
    /// `exited`, `dead`, `paused`, ... or anything else the engine reported.
    Unrecognized(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "running" => RunStatus::Running,
            "created" => RunStatus::Created,
            "restarting" => RunStatus::Restarting,
            other => RunStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Created => "created",
            RunStatus::Restarting => "restarting",
            RunStatus::Unrecognized(raw) => raw,
        }
    }
}

macro_rules! string_conversions {
    ($ty:ty) => {
        impl From<String> for $ty {
            fn from(raw: String) -> Self {
                <$ty>::parse(&raw)
            }
        }

        impl From<$ty> for String {
            fn from(status: $ty) -> Self {
                status.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_conversions!(HealthStatus);
string_conversions!(RunStatus);

/// Which status a container is waited on, decided once per container.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaitPolicy {
    /// The container declares a probe: wait for `healthy`.
    WaitHealthy,
    /// No usable probe: wait for `running`.
    WaitRunning,
}

impl WaitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitPolicy::WaitHealthy => "healthy",
            WaitPolicy::WaitRunning => "running",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_parse() {
        assert_eq!(HealthStatus::parse("healthy\n"), HealthStatus::Healthy);
        assert_eq!(HealthStatus::parse(" unhealthy"), HealthStatus::Unhealthy);
        assert_eq!(HealthStatus::parse("starting"), HealthStatus::Starting);
        assert_eq!(
            HealthStatus::parse("Healthy"),
            HealthStatus::Unrecognized("Healthy".into())
        );
    }

    #[test]
    fn run_status_parse() {
        assert_eq!(RunStatus::parse("running"), RunStatus::Running);
        assert_eq!(RunStatus::parse("created"), RunStatus::Created);
        assert_eq!(RunStatus::parse("restarting"), RunStatus::Restarting);
        assert_eq!(
            RunStatus::parse("exited"),
            RunStatus::Unrecognized("exited".into())
        );
    }

    #[test]
    fn unrecognized_keeps_raw_text() {
        let status = RunStatus::parse("  paused ");
        assert_eq!(status.to_string(), "paused");

        let json = serde_json::to_string(&HealthStatus::Unrecognized("none".into())).unwrap();
        assert_eq!(json, r#""none""#);
        let back: HealthStatus = serde_json::from_str(r#""starting""#).unwrap();
        assert_eq!(back, HealthStatus::Starting);
    }
}
