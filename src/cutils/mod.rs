use std::io;

/// Turn the `-1` failure convention of libc calls into an [`io::Error`] read from `errno`.
pub fn cerr<Int: Copy + TryInto<libc::c_long>>(res: Int) -> io::Result<Int> {
    match res.try_into() {
        Ok(-1) => Err(io::Error::last_os_error()),
        _ => Ok(res),
    }
}

/// Returns `true` if the call failed only because a signal handler ran while it was blocked.
pub fn was_interrupted(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINTR)
}
