#![forbid(unsafe_code)]

use std::io::{self, BufRead};

use crate::{
    cli::{help, ShellAction, ShellOptions},
    common::{CommandSpec, Error},
    cutils::was_interrupted,
    exec::{run_command, Session, SignalPolicy},
    log::{dev_info, user_error},
};

use builtin::{Builtin, Flow};

mod builtin;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const PROMPT: &str = ": ";

/// Read one line, including its newline. Returns `Ok(None)` at end of input.
fn read_line(input: &mut impl BufRead, buffer: &mut Vec<u8>) -> io::Result<Option<String>> {
    buffer.clear();
    loop {
        match input.read_until(b'\n', buffer) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(String::from_utf8_lossy(buffer).into_owned())),
            Err(err) if was_interrupted(&err) => {}
            Err(err) => return Err(err),
        }
    }
}

fn run_line(session: &mut Session, line: &str) -> Result<Flow, Error> {
    let spec = match CommandSpec::parse(line, session.pid()) {
        Ok(Some(spec)) => spec,
        Ok(None) => return Ok(Flow::Continue),
        Err(err) => {
            dev_info!("not executing line: {err}");
            return Ok(Flow::Continue);
        }
    };

    match Builtin::from_name(spec.program()) {
        Some(builtin) => builtin.run(&spec, session),
        None => run_command(session, spec).map(|()| Flow::Continue),
    }
}

fn interactive_loop() -> Result<(), Error> {
    let signals = SignalPolicy::install().map_err(Error::SignalSetup)?;
    let mut session = Session::new(signals);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut buffer = Vec::new();

    loop {
        session.sweep();
        prompt!("{PROMPT}");

        let Some(line) = read_line(&mut input, &mut buffer).map_err(Error::Input)? else {
            dev_info!("end of input");
            return Ok(());
        };

        match run_line(&mut session, &line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => return Ok(()),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => user_error!("{err}"),
        }
    }
}

fn shell_process() -> Result<(), Error> {
    crate::log::ShellLogger::new("smallsh: ").into_global_logger();

    dev_info!("development logs are enabled");

    match ShellOptions::from_env() {
        Ok(options) => match options.action {
            ShellAction::Help => {
                report!("{}", help::long_help_message());
                std::process::exit(0);
            }
            ShellAction::Version => {
                report!("smallsh {VERSION}");
                std::process::exit(0);
            }
            ShellAction::Run => interactive_loop(),
        },
        Err(e) => {
            eprintln_ignore_io_error!("{e}\n{}", help::USAGE_MSG);
            std::process::exit(1);
        }
    }
}

pub fn main() {
    match shell_process() {
        Ok(()) => (),
        Err(error) => {
            user_error!("{error}");
            std::process::exit(1);
        }
    }
}
