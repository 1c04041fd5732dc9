//! Domain types shared by the rollout crates.
//!
//! Nothing here talks to the container engine; these are the values the engine's answers are
//! parsed into and the verdict the coordinator produces from them.

mod container;
pub use container::{ContainerRef, ContainerSet, SHORT_ID_LEN, short_id};

mod status;
pub use status::{HealthStatus, RunStatus, WaitPolicy};

mod outcome;
pub use outcome::{DeploymentOutcome, OutcomeReason};
