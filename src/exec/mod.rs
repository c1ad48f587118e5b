mod jobs;
mod redirect;
mod signal_policy;
mod status;

use std::{
    borrow::Cow,
    io::{self, Write},
    os::unix::process::CommandExt,
    process::Command,
};

use crate::{
    common::{CommandSpec, Error},
    cutils::was_interrupted,
    log::{dev_debug, dev_info, dev_warn, user_error, user_warn},
    system::{
        fork,
        interface::ProcessId,
        signal::{signal_name, SignalNumber},
        wait::{Wait, WaitError, WaitOptions},
        ForkResult, _exit,
    },
};

pub(crate) use jobs::JobTable;
pub(crate) use signal_policy::SignalPolicy;
pub(crate) use status::ExitStatus;

use self::{jobs::AnyChild, redirect::Redirections, signal_policy::ToggleHold};

/// Everything the shell remembers between two command lines.
pub(crate) struct Session {
    pid: ProcessId,
    last_status: ExitStatus,
    jobs: JobTable,
    signals: SignalPolicy,
}

impl Session {
    pub(crate) fn new(signals: SignalPolicy) -> Self {
        Self {
            pid: ProcessId::current(),
            last_status: ExitStatus::default(),
            jobs: JobTable::new(),
            signals,
        }
    }

    /// The process ID that `$$` expands to.
    pub(crate) fn pid(&self) -> ProcessId {
        self.pid
    }

    /// How the most recent foreground command terminated.
    pub(crate) fn last_status(&self) -> ExitStatus {
        self.last_status
    }

    pub(crate) fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Report every background job that has finished since the last sweep.
    pub(crate) fn sweep(&mut self) {
        let done = self.jobs.reap(&mut AnyChild);
        dev_debug!("{} finished, {} still running", done.len(), self.jobs.len());
        for (pid, status) in done {
            report!("background pid {pid} is done: {status}");
        }
    }
}

/// Run an external command.
///
/// A foreground command is waited for and becomes the session's last status. A background command
/// is announced and recorded in the job table. Either way, finished background jobs are reported
/// before this function returns.
pub(crate) fn run_command(session: &mut Session, spec: CommandSpec) -> Result<(), Error> {
    // sampled once, a toggle that arrives later applies to the next command
    let background = spec.background && !SignalPolicy::foreground_only();
    if spec.background && !background {
        dev_info!("foreground-only mode, running `{spec}` in the foreground");
    }

    session.signals.reapply().map_err(Error::SignalSetup)?;

    // the child must not inherit unwritten output
    io::stdout().flush().ok();

    let hold = SignalPolicy::hold_toggle();
    let child_pid = match fork() {
        Err(err) => {
            hold.release();
            return Err(Error::Fork(err));
        }
        Ok(ForkResult::Child) => exec_child(spec, background, &session.signals, hold),
        Ok(ForkResult::Parent(pid)) => {
            hold.release();
            pid
        }
    };

    let outcome = if background {
        dev_info!("started `{spec}` in the background as {child_pid}");
        report!("background pid is {child_pid}");
        if !session.jobs.record(child_pid) {
            dev_warn!("{child_pid} was already being tracked");
        }
        Ok(())
    } else {
        wait_foreground(child_pid).map(|status| {
            // reported even when a mode toggle arrived during the wait
            if let ExitStatus::Signaled(_) = status {
                report!("{status}");
            }
            session.last_status = status;
        })
    };

    session.sweep();

    outcome
}

// Never returns: the child either becomes the command or exits with status 1.
fn exec_child(
    spec: CommandSpec,
    background: bool,
    signals: &SignalPolicy,
    hold: ToggleHold,
) -> ! {
    if let Err(err) = signals.enter_child(background) {
        user_error!("cannot set up signal handling: {err}");
        _exit(1)
    }
    hold.release();

    if let Err(err) = Redirections::for_command(&spec, background).apply() {
        user_error!("{err}");
        _exit(1)
    }

    let err = Command::new(spec.program()).args(&spec.arguments[1..]).exec();
    user_error!("{}: {err}", spec.program());
    _exit(1)
}

fn wait_foreground(child_pid: ProcessId) -> Result<ExitStatus, Error> {
    loop {
        match child_pid.wait(WaitOptions::new()) {
            Ok((_, status)) => match ExitStatus::from_wait(&status) {
                Some(exit_status) => {
                    if let ExitStatus::Signaled(signal) = exit_status {
                        dev_info!("{child_pid} was terminated by {}", signal_fmt(signal));
                    }
                    return Ok(exit_status);
                }
                None => user_warn!("unexpected wait status for {child_pid}: {status:?}"),
            },
            Err(WaitError::Io(err)) if was_interrupted(&err) => {}
            Err(WaitError::Io(err)) => return Err(Error::Wait(child_pid, err)),
            // only possible with `WNOHANG`
            Err(WaitError::NotReady) => {}
        }
    }
}

fn signal_fmt(signal: SignalNumber) -> Cow<'static, str> {
    signal_name(signal)
        .map(|name| name.into())
        .unwrap_or_else(|| format!("signal #{signal}").into())
}
