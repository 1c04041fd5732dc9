use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("missing program")]
    MissingProgram,
    #[error("program not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("deadline exceeded; process terminated")]
    DeadlineExceeded,
}

impl ExecError {
    pub(crate) fn from_spawn(program: &str, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ExecError::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied(program.to_string()),
            _ => ExecError::Spawn(format!("{program}: {e}")),
        }
    }
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}
