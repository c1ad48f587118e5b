use std::{collections::BTreeSet, io};

use crate::{
    cutils::was_interrupted,
    log::{dev_info, user_error},
    system::{
        interface::ProcessId,
        wait::{Wait, WaitError, WaitOptions},
    },
};

use super::ExitStatus;

/// A source of terminated children.
pub(crate) trait Reap {
    /// Collect one terminated child without blocking.
    ///
    /// Returns `Ok(None)` if no child has terminated since the last call.
    fn reap_one(&mut self) -> io::Result<Option<(ProcessId, ExitStatus)>>;
}

/// Reaps any child of the current process with `waitpid(-1, WNOHANG)`.
pub(crate) struct AnyChild;

impl Reap for AnyChild {
    fn reap_one(&mut self) -> io::Result<Option<(ProcessId, ExitStatus)>> {
        loop {
            match ProcessId::ANY_CHILD.wait(WaitOptions::new().no_hang()) {
                Ok((pid, status)) => {
                    if let Some(exit_status) = ExitStatus::from_wait(&status) {
                        return Ok(Some((pid, exit_status)));
                    }
                }
                Err(WaitError::NotReady) => return Ok(None),
                Err(err) if err.is_no_children() => return Ok(None),
                Err(WaitError::Io(err)) if was_interrupted(&err) => {}
                Err(WaitError::Io(err)) => return Err(err),
            }
        }
    }
}

/// The background processes that have been launched but not yet reported as done.
#[derive(Debug, Default)]
pub(crate) struct JobTable {
    running: BTreeSet<ProcessId>,
}

impl JobTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Start tracking a background process.
    ///
    /// Returns `false` if the process was already tracked.
    pub(crate) fn record(&mut self, pid: ProcessId) -> bool {
        self.running.insert(pid)
    }

    pub(crate) fn is_tracked(&self, pid: ProcessId) -> bool {
        self.running.contains(&pid)
    }

    pub(crate) fn len(&self) -> usize {
        self.running.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Collect every child that has terminated so far and stop tracking the ones that were
    /// running in the background.
    ///
    /// The returned jobs are in the order the terminations were collected. Children that were
    /// never recorded are collected too, but not returned.
    pub(crate) fn reap(&mut self, reaper: &mut impl Reap) -> Vec<(ProcessId, ExitStatus)> {
        let mut done = Vec::new();

        loop {
            match reaper.reap_one() {
                Ok(Some((pid, status))) if self.is_tracked(pid) => {
                    self.running.remove(&pid);
                    done.push((pid, status));
                }
                Ok(Some((pid, status))) => {
                    dev_info!("collected untracked child {pid} ({status})");
                }
                Ok(None) => break,
                Err(err) => {
                    user_error!("cannot collect finished background jobs: {err}");
                    break;
                }
            }
        }

        done
    }
}
