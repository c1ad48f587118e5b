use std::fmt;

use crate::system::{signal::SignalNumber, wait::WaitStatus};

/// How a command terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitStatus {
    Exited(u8),
    Signaled(SignalNumber),
}

impl Default for ExitStatus {
    /// The status reported before any foreground command has run.
    fn default() -> Self {
        ExitStatus::Exited(0)
    }
}

impl ExitStatus {
    /// Classify a wait result. Returns `None` if the child has not terminated.
    pub(crate) fn from_wait(status: &WaitStatus) -> Option<Self> {
        if let Some(code) = status.exit_status() {
            // `WEXITSTATUS` only keeps the low eight bits
            Some(ExitStatus::Exited(code as u8))
        } else {
            status.term_signal().map(ExitStatus::Signaled)
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Exited(code) => write!(f, "exit value {code}"),
            ExitStatus::Signaled(signal) => write!(f, "terminated by signal {signal}"),
        }
    }
}
