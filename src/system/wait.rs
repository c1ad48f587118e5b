use std::{fmt, io};

use libc::{c_int, WEXITSTATUS, WIFEXITED, WIFSIGNALED, WNOHANG, WTERMSIG};

use crate::{
    cutils::cerr,
    system::{
        interface::ProcessId,
        signal::{signal_name, SignalNumber},
    },
};

mod sealed {
    pub(crate) trait Sealed {}

    impl Sealed for super::ProcessId {}
}

/// `waitpid` for a specific child or, through [`ProcessId::ANY_CHILD`], for whichever child
/// terminates first.
pub(crate) trait Wait: sealed::Sealed {
    /// Collect the termination status of a child, blocking unless [`WaitOptions::no_hang`] is
    /// set. Returns the pid of the collected child along with its status.
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError>;
}

impl Wait for ProcessId {
    fn wait(self, options: WaitOptions) -> Result<(ProcessId, WaitStatus), WaitError> {
        let mut raw: c_int = 0;
        let collected = cerr(unsafe { libc::waitpid(self.get(), &mut raw, options.flags) })
            .map_err(WaitError::Io)?;

        // `0` is only possible with `WNOHANG`: children exist, none has terminated
        if collected == 0 {
            return Err(WaitError::NotReady);
        }

        Ok((ProcessId::new(collected), WaitStatus { raw }))
    }
}

#[derive(Debug)]
pub enum WaitError {
    /// Nothing to collect yet. Only returned with [`WaitOptions::no_hang`].
    NotReady,
    Io(io::Error),
}

impl WaitError {
    /// `ECHILD`: there is no child left that could be waited for.
    pub fn is_no_children(&self) -> bool {
        matches!(self, WaitError::Io(err) if err.raw_os_error() == Some(libc::ECHILD))
    }
}

/// Flags passed to `waitpid`. The shell never asks for stopped or continued children.
#[derive(Clone, Copy)]
pub struct WaitOptions {
    flags: c_int,
}

impl WaitOptions {
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Poll instead of blocking.
    pub const fn no_hang(self) -> Self {
        Self {
            flags: self.flags | WNOHANG,
        }
    }
}

/// The raw status word reported for a terminated child.
pub struct WaitStatus {
    raw: c_int,
}

impl WaitStatus {
    /// The value the child passed to `exit`, if it exited normally.
    pub const fn exit_status(&self) -> Option<c_int> {
        if WIFEXITED(self.raw) {
            Some(WEXITSTATUS(self.raw))
        } else {
            None
        }
    }

    /// The signal that killed the child, if it did not exit normally.
    pub const fn term_signal(&self) -> Option<SignalNumber> {
        if WIFSIGNALED(self.raw) {
            Some(WTERMSIG(self.raw))
        } else {
            None
        }
    }
}

impl fmt::Debug for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exit_status(), self.term_signal()) {
            (Some(code), _) => write!(f, "Exited({code})"),
            (_, Some(signal)) => match signal_name(signal) {
                Some(name) => write!(f, "Signaled({name})"),
                None => write!(f, "Signaled({signal})"),
            },
            _ => write!(f, "Raw({:#x})", self.raw),
        }
    }
}
