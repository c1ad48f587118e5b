use std::io;

use crate::log::dev_warn;

use super::{consts::*, set::SignalAction, signal_name, SignalNumber};

/// What happens when a signal arrives.
#[derive(Clone, Copy)]
pub(crate) enum SignalHandlerBehavior {
    Default,
    Ignore,
    /// Call the function, which may only use async-signal-safe calls.
    Catch(extern "C" fn(SignalNumber)),
}

/// A disposition installed for one signal.
///
/// Dropping it puts back the disposition that was in place before [`SignalHandler::register`].
pub(crate) struct SignalHandler {
    signal: SignalNumber,
    installed: SignalAction,
    replaced: SignalAction,
}

impl SignalHandler {
    /// # Panics
    ///
    /// For `SIGKILL` and `SIGSTOP`, whose disposition cannot change.
    pub(crate) fn register(
        signal: SignalNumber,
        behavior: SignalHandlerBehavior,
    ) -> io::Result<Self> {
        assert!(
            signal != SIGKILL && signal != SIGSTOP,
            "{} cannot be caught or ignored",
            signal_name(signal).unwrap_or("signal")
        );

        let installed = SignalAction::new(behavior)?;
        let replaced = installed.register(signal)?;

        Ok(Self {
            signal,
            installed,
            replaced,
        })
    }

    /// Install the same disposition again.
    pub(crate) fn reapply(&self) -> io::Result<()> {
        self.installed.register(self.signal).map(drop)
    }

    /// Keep the disposition for good, e.g. in a child about to `exec`.
    pub(crate) fn forget(self) {
        std::mem::forget(self)
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        if let Err(err) = self.replaced.register(self.signal) {
            dev_warn!(
                "cannot restore the disposition of {}: {err}",
                signal_name(self.signal).unwrap_or("signal"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::system::{
        fork,
        interface::ProcessId,
        wait::{Wait, WaitOptions},
        ForkResult, _exit,
    };

    use super::{SignalHandler, SignalHandlerBehavior, SIGTERM};

    static CAUGHT: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count(_signal: libc::c_int) {
        CAUGHT.fetch_add(1, Ordering::SeqCst);
    }

    // dispositions are process-wide, so every test mutates them in a forked child only
    fn in_child(check: impl FnOnce() -> bool) {
        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            _exit(if check() { 0 } else { 1 });
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0), "check failed in child");
    }

    fn raise(signal: libc::c_int) {
        unsafe { libc::kill(ProcessId::current().get(), signal) };
    }

    #[test]
    fn ignore_survives_signal() {
        in_child(|| {
            let handler = SignalHandler::register(SIGTERM, SignalHandlerBehavior::Ignore).unwrap();
            raise(SIGTERM);
            handler.forget();
            true
        });
    }

    #[test]
    fn catch_runs_function() {
        in_child(|| {
            let handler =
                SignalHandler::register(SIGTERM, SignalHandlerBehavior::Catch(count)).unwrap();
            raise(SIGTERM);
            raise(SIGTERM);
            drop(handler);
            CAUGHT.load(Ordering::SeqCst) == 2
        });
    }

    #[test]
    fn drop_restores_previous() {
        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            let outer = SignalHandler::register(SIGTERM, SignalHandlerBehavior::Default).unwrap();
            let inner = SignalHandler::register(SIGTERM, SignalHandlerBehavior::Ignore).unwrap();
            drop(inner);
            outer.forget();
            // back to the default action, so this terminates the child
            raise(SIGTERM);
            _exit(0);
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.term_signal(), Some(SIGTERM));
    }
}
