use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text or json)")]
    InvalidFormat(String),
    #[error("invalid log level directive {directive:?}: {reason}")]
    InvalidLevel { directive: String, reason: String },
    #[error("a logger is already installed")]
    AlreadyInitialized,
    #[error("cannot install logger: {0}")]
    Install(String),
}
