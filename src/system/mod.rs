//! Thin wrappers over the process, descriptor and signal calls the shell makes.
use std::{
    io,
    os::fd::{AsRawFd, RawFd},
};

use crate::cutils::{cerr, was_interrupted};
use interface::ProcessId;

pub mod interface;
pub mod signal;
pub mod wait;

/// Leave the process right away, skipping atexit handlers and stdio flushing.
pub(crate) fn _exit(status: libc::c_int) -> ! {
    unsafe { libc::_exit(status) }
}

pub(crate) enum ForkResult {
    /// Returned in the original process, with the pid of the new one.
    Parent(ProcessId),
    Child,
}

pub(crate) fn fork() -> io::Result<ForkResult> {
    // SAFETY: the shell never spawns threads, so no lock can be held by another thread at the
    // moment of the fork and the child may use the allocator until it calls `exec`
    match cerr(unsafe { libc::fork() })? {
        0 => Ok(ForkResult::Child),
        pid => Ok(ForkResult::Parent(ProcessId::new(pid))),
    }
}

/// Point `target` at the open file behind `fd`, closing what `target` referred to before.
///
/// `fd` stays open and remains owned by the caller.
pub(crate) fn dup2<F: AsRawFd>(fd: &F, target: RawFd) -> io::Result<()> {
    cerr(unsafe { libc::dup2(fd.as_raw_fd(), target) })?;
    Ok(())
}

/// Write all of `bytes` to `fd` using `write(2)` directly. Safe to call from a signal handler.
///
/// Errors other than `EINTR` end the write silently.
pub(crate) fn write_unbuffered(fd: RawFd, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match cerr(unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) }) {
            Ok(written) => bytes = &bytes[written as usize..],
            Err(err) if was_interrupted(&err) => {}
            Err(_) => return,
        }
    }
}

pub(crate) fn make_zeroed_sigaction() -> libc::sigaction {
    // SAFETY: `sigaction` is plain C data; the zeroed value has no handler, flags or mask
    unsafe { std::mem::zeroed() }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::File,
        io::{Read, Seek, Write},
        os::{fd::AsRawFd, unix::net::UnixStream},
        time::{SystemTime, UNIX_EPOCH},
    };

    use libc::STDOUT_FILENO;

    use super::{
        dup2, fork,
        interface::ProcessId,
        wait::{Wait, WaitOptions},
        write_unbuffered, ForkResult, _exit,
    };

    fn scratch_file() -> File {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let path = std::env::temp_dir().join(format!("smallsh_dup2_{}_{nanos}", std::process::id()));
        File::options()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .unwrap()
    }

    #[test]
    fn fork_reports_child_pid() {
        let (mut rx, mut tx) = UnixStream::pair().unwrap();

        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            let pid = ProcessId::current().get();
            tx.write_all(&pid.to_ne_bytes()).ok();
            _exit(7);
        };
        drop(tx);

        let mut buf = [0; 4];
        rx.read_exact(&mut buf).unwrap();
        assert_eq!(child_pid.get(), i32::from_ne_bytes(buf));

        let (pid, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(pid, child_pid);
        assert_eq!(status.exit_status(), Some(7));
    }

    #[test]
    fn dup2_replaces_stdout_in_child() {
        let mut file = scratch_file();

        let ForkResult::Parent(child_pid) = fork().unwrap() else {
            if dup2(&file, STDOUT_FILENO).is_err() {
                _exit(1);
            }
            write_unbuffered(STDOUT_FILENO, b"hello from the child\n");
            _exit(0);
        };

        let (_, status) = child_pid.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0));

        let mut contents = String::new();
        file.rewind().unwrap();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello from the child\n");
    }

    #[test]
    fn dup2_rejects_bad_descriptor() {
        struct Bad;
        impl AsRawFd for Bad {
            fn as_raw_fd(&self) -> std::os::fd::RawFd {
                -1
            }
        }

        let err = dup2(&Bad, 1000).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
