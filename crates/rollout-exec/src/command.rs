use std::fmt;

/// A program and its ordered argument list.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit code and combined stdout/stderr of a finished process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProcOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub output: String,
}

impl ProcOutput {
    pub fn new(code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            code,
            output: output.into(),
        }
    }

    #[inline]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Output with surrounding whitespace removed; what `inspect --format` answers are read from.
    #[inline]
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}

/// How a follow-mode process stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FollowEnd {
    /// Output reached end-of-stream and the process exited on its own.
    Exited { code: Option<i32> },
    /// The caller's token fired; the process was killed.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_args() {
        let cmd = CommandSpec::new("docker")
            .arg("rm")
            .args(["-f", "abc"]);
        assert_eq!(cmd.to_string(), "docker rm -f abc");
        assert_eq!(CommandSpec::new("true").to_string(), "true");
    }

    #[test]
    fn output_success_only_on_zero() {
        assert!(ProcOutput::new(Some(0), "").success());
        assert!(!ProcOutput::new(Some(1), "").success());
        assert!(!ProcOutput::new(None, "").success());
        assert_eq!(ProcOutput::new(Some(0), " running\n").trimmed(), "running");
    }
}
