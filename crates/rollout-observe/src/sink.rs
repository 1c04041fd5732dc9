use std::sync::{Arc, Mutex};

use tracing::info;

/// Destination for lines produced by the stack itself (as opposed to our own diagnostics).
///
/// Handed to the components that forward foreign output so tests can capture it.
pub trait LineSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Emits each line as an `info` event on the `rollout.stack` target.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    stack: Option<String>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every line with the stack it came from.
    pub fn for_stack(stack: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
        }
    }
}

impl LineSink for TracingSink {
    fn emit(&self, line: &str) {
        match &self.stack {
            Some(stack) => info!(target: "rollout.stack", stack = %stack, "{line}"),
            None => info!(target: "rollout.stack", "{line}"),
        }
    }
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LineSink for MemorySink {
    fn emit(&self, line: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line.to_string()),
            Err(poisoned) => poisoned.into_inner().push(line.to_string()),
        }
    }
}

impl<T: LineSink + ?Sized> LineSink for Arc<T> {
    fn emit(&self, line: &str) {
        (**self).emit(line)
    }
}
