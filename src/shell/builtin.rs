use std::{env, path::PathBuf};

use crate::{
    common::{CommandSpec, Error},
    exec::Session,
    log::dev_info,
};

/// Commands the shell runs itself instead of starting a program.
///
/// Built-ins ignore the background marker and any redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Exit,
    Cd,
    Status,
}

/// What the shell loop does after a built-in.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

impl Builtin {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "exit" => Some(Builtin::Exit),
            "cd" => Some(Builtin::Cd),
            "status" => Some(Builtin::Status),
            _ => None,
        }
    }

    pub(crate) fn run(self, spec: &CommandSpec, session: &mut Session) -> Result<Flow, Error> {
        if spec.background || spec.input.is_some() || spec.output.is_some() {
            dev_info!("ignoring directives for built-in `{spec}`");
        }

        match self {
            Builtin::Exit => {
                if !session.jobs().is_empty() {
                    dev_info!("leaving {} background job(s) running", session.jobs().len());
                }
                Ok(Flow::Exit)
            }
            Builtin::Cd => {
                change_directory(spec.arguments.get(1).map(String::as_str))?;
                Ok(Flow::Continue)
            }
            Builtin::Status => {
                report!("{}", session.last_status());
                Ok(Flow::Continue)
            }
        }
    }
}

/// Change the working directory of the shell to `target`, or to `HOME` if no target is given.
fn change_directory(target: Option<&str>) -> Result<(), Error> {
    let path = match target {
        Some(target) => PathBuf::from(target),
        None => env::var_os("HOME").map(PathBuf::from).ok_or(Error::HomeNotSet)?,
    };

    env::set_current_dir(&path).map_err(|err| Error::ChangeDirectory(path, err))
}
