use crate::system::interface::ProcessId;
use std::{fmt, io, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    Fork(io::Error),
    Wait(ProcessId, io::Error),
    SignalSetup(io::Error),
    Input(io::Error),
    ChangeDirectory(PathBuf, io::Error),
    HomeNotSet,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Fork(e) => write!(f, "cannot create a new process: {e}"),
            Error::Wait(pid, e) => write!(f, "cannot wait for process {pid}: {e}"),
            Error::SignalSetup(e) => write!(f, "cannot set up signal handling: {e}"),
            Error::Input(e) => write!(f, "cannot read input: {e}"),
            Error::ChangeDirectory(path, e) => write!(f, "cd: {}: {e}", path.display()),
            Error::HomeNotSet => f.write_str("cd: HOME not set"),
        }
    }
}

impl Error {
    /// Returns `true` if the session cannot continue after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fork(_) | Error::SignalSetup(_) | Error::Input(_))
    }
}
