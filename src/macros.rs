// the `std::print` macros panic on any IO error. a shell whose stdout went away must keep
// reaping its children, so everything goes through these instead.

/// Write one report line (job notices, `status` output) to stdout.
macro_rules! report {
    ($($tt:tt)*) => {{
        use std::io::Write;
        let _ = writeln!(std::io::stdout(), $($tt)*);
    }}
}

/// Write text without a trailing newline and flush it, so it is visible before the shell blocks.
macro_rules! prompt {
    ($($tt:tt)*) => {{
        use std::io::Write;
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, $($tt)*);
        let _ = stdout.flush();
    }}
}

macro_rules! eprintln_ignore_io_error {
    ($($tt:tt)*) => {{
        use std::io::Write;
        let _ = writeln!(std::io::stderr(), $($tt)*);
    }}
}

// catch unintentional uses of `print*` macros with the test suite
#[allow(unused_macros)]
#[cfg(debug_assertions)]
macro_rules! println {
    ($($tt:tt)*) => {
        compile_error!("do not use `println!`; use the `report!` macro instead")
    };
}

#[allow(unused_macros)]
#[cfg(debug_assertions)]
macro_rules! print {
    ($($tt:tt)*) => {
        compile_error!("do not use `print!`; use the `prompt!` macro instead")
    };
}

#[allow(unused_macros)]
#[cfg(debug_assertions)]
macro_rules! eprintln {
    ($($tt:tt)*) => {
        compile_error!("do not use `eprintln!`; use the `user_error!` macro instead")
    };
}
