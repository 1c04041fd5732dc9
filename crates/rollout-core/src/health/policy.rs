use rollout_model::{HealthStatus, RunStatus, WaitPolicy};

/// Answers of a probe-status inspect that mean "no probe declared".
const NO_PROBE: &[&str] = &["", "<no value>", "<nil>", "map[]"];

/// Choose the wait policy from a successful probe-status inspect.
pub fn policy_from_probe(output: &str) -> WaitPolicy {
    if NO_PROBE.contains(&output.trim()) {
        WaitPolicy::WaitRunning
    } else {
        WaitPolicy::WaitHealthy
    }
}

/// Effect of one poll on a waiting container.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    Success,
    Stay,
    Unhealthy,
    Unknown(String),
}

pub fn on_health(status: &HealthStatus) -> Transition {
    match status {
        HealthStatus::Healthy => Transition::Success,
        HealthStatus::Starting => Transition::Stay,
        HealthStatus::Unhealthy => Transition::Unhealthy,
        HealthStatus::Unrecognized(raw) => Transition::Unknown(raw.clone()),
    }
}

pub fn on_run(status: &RunStatus) -> Transition {
    match status {
        RunStatus::Running => Transition::Success,
        RunStatus::Created | RunStatus::Restarting => Transition::Stay,
        RunStatus::Unrecognized(raw) => Transition::Unknown(raw.clone()),
    }
}
