//! Stack rollout: bring a compose stack up, recover from a stale container holding a name,
//! then race health evaluation against the stack's log stream under one deadline.

pub mod config;
pub use config::{ConfigError, RolloutConfig, parse_flag, parse_timeout};

pub mod error;
pub use error::{
    DeployError, DiscoveryError, HealthError, HostsError, InvokeError, MaintenanceError,
    StreamError,
};

mod compose;
pub use compose::ComposeCli;

pub mod conflict;
pub use conflict::{Conflict, ConflictResolver, Resolution};

mod invoker;
pub use invoker::{BringUp, StackInvoker};

mod discovery;
pub use discovery::ContainerDiscovery;

pub mod health;
pub use health::HealthMonitor;

mod stream;
pub use stream::{LogStreamer, StreamEnd};

mod coordinator;
pub use coordinator::Coordinator;

pub mod hosts;
pub use hosts::{HostsFile, HostsUpdate};

mod maintenance;
pub use maintenance::Maintenance;

#[cfg(test)]
pub(crate) mod testing;
