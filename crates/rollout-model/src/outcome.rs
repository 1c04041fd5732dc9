use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a deployment ended the way it did.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeReason {
    /// Every container reached `healthy` or `running`.
    Ready,
    /// A probe reported `unhealthy`.
    Unhealthy,
    /// The engine reported a status outside the expected set.
    UnknownStatus,
    /// A wait budget elapsed before a terminal status was observed.
    Timeout,
    /// A status query failed while waiting for a terminal status.
    InspectFailed,
    /// Health evaluation was stopped before reaching a verdict.
    Cancelled,
}

impl OutcomeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeReason::Ready => "ready",
            OutcomeReason::Unhealthy => "unhealthy",
            OutcomeReason::UnknownStatus => "unknown status",
            OutcomeReason::Timeout => "timeout",
            OutcomeReason::InspectFailed => "inspect failed",
            OutcomeReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OutcomeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one coordinator run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOutcome {
    pub ok: bool,
    pub reason: OutcomeReason,
    /// Human-readable detail, naming the offending container when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DeploymentOutcome {
    pub fn ready() -> Self {
        Self {
            ok: true,
            reason: OutcomeReason::Ready,
            detail: None,
        }
    }

    pub fn failed(reason: OutcomeReason, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason,
            detail: Some(detail.into()),
        }
    }

    /// Process exit code for this outcome.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        if self.ok { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(DeploymentOutcome::ready().exit_code(), 0);
        let failed = DeploymentOutcome::failed(OutcomeReason::Timeout, "web (abc) timed out");
        assert_eq!(failed.exit_code(), 1);
        assert!(!failed.ok);
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&DeploymentOutcome::ready()).unwrap();
        assert_eq!(json, r#"{"ok":true,"reason":"ready"}"#);

        let failed = DeploymentOutcome::failed(OutcomeReason::UnknownStatus, "db: exited");
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(
            json,
            r#"{"ok":false,"reason":"unknownStatus","detail":"db: exited"}"#
        );
    }
}
