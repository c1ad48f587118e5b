use std::{io, mem::MaybeUninit};

use libc::{c_int, sigset_t};

use crate::{cutils::cerr, system::make_zeroed_sigaction};

use super::{handler::SignalHandlerBehavior, SignalNumber};

/// A `sigaction` value, as installed for one signal.
#[repr(transparent)]
pub(super) struct SignalAction {
    raw: libc::sigaction,
}

impl SignalAction {
    pub(super) fn new(behavior: SignalHandlerBehavior) -> io::Result<Self> {
        let mut raw = make_zeroed_sigaction();
        // interrupted `read` and `waitpid` calls resume instead of failing
        raw.sa_flags = libc::SA_RESTART;

        match behavior {
            SignalHandlerBehavior::Default => raw.sa_sigaction = libc::SIG_DFL,
            SignalHandlerBehavior::Ignore => raw.sa_sigaction = libc::SIG_IGN,
            SignalHandlerBehavior::Catch(function) => {
                raw.sa_sigaction = function as libc::sighandler_t;
                // nothing else is delivered while the function runs
                raw.sa_mask = SignalSet::full()?.raw;
            }
        }

        Ok(Self { raw })
    }

    /// Install this action for `signal`, returning the action it replaced.
    pub(super) fn register(&self, signal: SignalNumber) -> io::Result<Self> {
        let mut previous = MaybeUninit::<libc::sigaction>::zeroed();
        cerr(unsafe { libc::sigaction(signal, &self.raw, previous.as_mut_ptr()) })?;

        Ok(Self {
            raw: unsafe { previous.assume_init() },
        })
    }
}

/// A set of signals, used to change the signal mask of the calling thread.
#[repr(transparent)]
pub(crate) struct SignalSet {
    raw: sigset_t,
}

impl SignalSet {
    fn init(fill: unsafe extern "C" fn(*mut sigset_t) -> c_int) -> io::Result<Self> {
        let mut raw = MaybeUninit::<sigset_t>::zeroed();
        cerr(unsafe { fill(raw.as_mut_ptr()) })?;

        Ok(Self {
            raw: unsafe { raw.assume_init() },
        })
    }

    pub(crate) fn empty() -> io::Result<Self> {
        Self::init(libc::sigemptyset)
    }

    pub(crate) fn full() -> io::Result<Self> {
        Self::init(libc::sigfillset)
    }

    pub(crate) fn of(signals: &[SignalNumber]) -> io::Result<Self> {
        let mut set = Self::empty()?;
        for &signal in signals {
            cerr(unsafe { libc::sigaddset(&mut set.raw, signal) })?;
        }

        Ok(set)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, signal: SignalNumber) -> bool {
        unsafe { libc::sigismember(&self.raw, signal) == 1 }
    }

    fn change_mask(&self, how: c_int) -> io::Result<Self> {
        let mut previous = MaybeUninit::<sigset_t>::zeroed();
        cerr(unsafe { libc::sigprocmask(how, &self.raw, previous.as_mut_ptr()) })?;

        Ok(Self {
            raw: unsafe { previous.assume_init() },
        })
    }

    /// Add these signals to the blocked ones. Returns the mask as it was before.
    pub(crate) fn block(&self) -> io::Result<Self> {
        self.change_mask(libc::SIG_BLOCK)
    }

    /// Make this set the whole mask. Returns the mask as it was before.
    pub(crate) fn set_mask(&self) -> io::Result<Self> {
        self.change_mask(libc::SIG_SETMASK)
    }
}
