use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use libc::STDOUT_FILENO;

use crate::{
    log::dev_warn,
    system::{
        signal::{consts::*, SignalHandler, SignalHandlerBehavior, SignalNumber, SignalSet},
        write_unbuffered,
    },
};

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const ENTER_NOTICE: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n";
const EXIT_NOTICE: &[u8] = b"\nExiting foreground-only mode\n";

extern "C" fn toggle_foreground_only(_signal: SignalNumber) {
    let was_enabled = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    let notice = if was_enabled { EXIT_NOTICE } else { ENTER_NOTICE };
    write_unbuffered(STDOUT_FILENO, notice);
}

/// The shell's own signal dispositions.
///
/// The shell ignores `SIGINT` and toggles foreground-only mode on `SIGTSTP`. Dropping this value
/// restores whatever dispositions the shell inherited.
pub(crate) struct SignalPolicy {
    interrupt: SignalHandler,
    stop: SignalHandler,
}

impl SignalPolicy {
    pub(crate) fn install() -> io::Result<Self> {
        let interrupt = SignalHandler::register(SIGINT, SignalHandlerBehavior::Ignore)?;
        let stop = SignalHandler::register(
            SIGTSTP,
            SignalHandlerBehavior::Catch(toggle_foreground_only),
        )?;

        Ok(Self { interrupt, stop })
    }

    /// Bind both signals again.
    pub(crate) fn reapply(&self) -> io::Result<()> {
        self.interrupt.reapply()?;
        self.stop.reapply()
    }

    /// Returns `true` while the background marker is being ignored.
    pub(crate) fn foreground_only() -> bool {
        FOREGROUND_ONLY.load(Ordering::SeqCst)
    }

    /// Keep `SIGTSTP` pending until the returned hold is released.
    ///
    /// Holding the signal across `fork` means the child can never run the toggle handler before
    /// it has switched to its own dispositions.
    pub(crate) fn hold_toggle() -> ToggleHold {
        let previous = SignalSet::of(&[SIGTSTP]).and_then(|set| set.block());
        match previous {
            Ok(previous) => ToggleHold {
                previous: Some(previous),
            },
            Err(err) => {
                dev_warn!("cannot block SIGTSTP: {err}");
                ToggleHold { previous: None }
            }
        }
    }

    /// Switch a freshly forked child to the dispositions its command runs with.
    ///
    /// `SIGTSTP` is ignored in every child. `SIGINT` gets its default action in foreground
    /// children and stays ignored in background ones. The child never drops the policy it
    /// inherited, it either replaces its image or exits right away.
    pub(crate) fn enter_child(&self, background: bool) -> io::Result<()> {
        SignalHandler::register(SIGTSTP, SignalHandlerBehavior::Ignore)?.forget();
        if !background {
            SignalHandler::register(SIGINT, SignalHandlerBehavior::Default)?.forget();
        }

        Ok(())
    }
}

/// A blocked `SIGTSTP`, see [`SignalPolicy::hold_toggle`].
pub(crate) struct ToggleHold {
    previous: Option<SignalSet>,
}

impl ToggleHold {
    /// Restore the signal mask from before the hold. A pending `SIGTSTP` is delivered now.
    pub(crate) fn release(self) {
        if let Some(previous) = self.previous {
            if let Err(err) = previous.set_mask() {
                dev_warn!("cannot unblock SIGTSTP: {err}");
            }
        }
    }
}
