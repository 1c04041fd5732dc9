//! External process execution.
//!
//! Everything the rollout knows about the container engine goes through [`ProcessRunner`]:
//! a command name, an argument list, and the captured output plus exit code that come back.

mod error;
pub use error::{ExecError, ExecResult};

mod command;
pub use command::{CommandSpec, FollowEnd, ProcOutput};

mod runner;
pub use runner::ProcessRunner;

pub mod proc;
pub use proc::SystemRunner;

mod util;
