use std::{
    fmt,
    fs::{File, OpenOptions},
    io,
    os::{fd::RawFd, unix::fs::OpenOptionsExt},
    path::{Path, PathBuf},
};

use libc::{STDIN_FILENO, STDOUT_FILENO};

use crate::{common::CommandSpec, system::dup2};

/// Where background commands read from and write to when no path was given.
pub(crate) const NULL_DEVICE: &str = "/dev/null";

/// Permission bits for files created by output redirection, before the umask applies.
const OUTPUT_MODE: u32 = 0o744;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Input,
    Output,
}

impl Direction {
    fn target(self) -> RawFd {
        match self {
            Direction::Input => STDIN_FILENO,
            Direction::Output => STDOUT_FILENO,
        }
    }

    fn open(self, path: &Path) -> io::Result<File> {
        match self {
            Direction::Input => File::open(path),
            Direction::Output => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(OUTPUT_MODE)
                .open(path),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
        })
    }
}

#[derive(Debug)]
pub(crate) struct RedirectError {
    pub(crate) path: PathBuf,
    pub(crate) direction: Direction,
    pub(crate) source: io::Error,
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot open {} for {}: {}",
            self.path.display(),
            self.direction,
            self.source
        )
    }
}

/// The files a command's standard input and output are bound to.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Redirections {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Redirections {
    /// Background commands that did not name a file use the null device instead of the
    /// terminal.
    pub(crate) fn for_command(spec: &CommandSpec, background: bool) -> Self {
        let fallback = || background.then(|| PathBuf::from(NULL_DEVICE));

        Self {
            input: spec.input.clone().or_else(fallback),
            output: spec.output.clone().or_else(fallback),
        }
    }

    /// Rebind standard input and output of the current process.
    ///
    /// Only meant for a forked child. Input is handled first, so a missing input file leaves the
    /// output file untouched.
    pub(crate) fn apply(&self) -> Result<(), RedirectError> {
        let pairs = [
            (Direction::Input, &self.input),
            (Direction::Output, &self.output),
        ];

        for (direction, path) in pairs {
            let Some(path) = path else {
                continue;
            };

            let error = |source| RedirectError {
                path: path.clone(),
                direction,
                source,
            };

            let file = direction.open(path).map_err(error)?;
            dup2(&file, direction.target()).map_err(error)?;
            // `file` is closed here, the duplicate stays open across `exec`
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        os::unix::fs::PermissionsExt,
        path::{Path, PathBuf},
    };

    use libc::{STDIN_FILENO, STDOUT_FILENO};
    use pretty_assertions::assert_eq;

    use super::{Direction, Redirections, NULL_DEVICE};
    use crate::{
        common::CommandSpec,
        system::{
            fork,
            interface::ProcessId,
            wait::{Wait, WaitOptions},
            write_unbuffered, ForkResult, _exit,
        },
    };

    fn scratch(name: &str) -> PathBuf {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "smallsh_redirect_{name}_{}_{timestamp}",
            std::process::id()
        ))
    }

    fn spec(line: &str) -> CommandSpec {
        CommandSpec::parse(line, ProcessId::new(1)).unwrap().unwrap()
    }

    fn in_child(body: impl FnOnce() -> i32) -> Option<i32> {
        let ForkResult::Parent(pid) = fork().unwrap() else {
            _exit(body());
        };
        let (_, status) = pid.wait(WaitOptions::new()).unwrap();
        status.exit_status()
    }

    #[test]
    fn foreground_keeps_the_terminal() {
        assert_eq!(
            Redirections::for_command(&spec("ls"), false),
            Redirections::default()
        );
    }

    #[test]
    fn background_falls_back_to_null_device() {
        let redirections = Redirections::for_command(&spec("sleep 5 &"), true);
        assert_eq!(redirections.input, Some(PathBuf::from(NULL_DEVICE)));
        assert_eq!(redirections.output, Some(PathBuf::from(NULL_DEVICE)));

        let redirections = Redirections::for_command(&spec("sort < data &"), true);
        assert_eq!(redirections.input, Some(PathBuf::from("data")));
        assert_eq!(redirections.output, Some(PathBuf::from(NULL_DEVICE)));
    }

    #[test]
    fn explicit_paths_in_foreground() {
        let redirections = Redirections::for_command(&spec("sort > sorted"), false);
        assert_eq!(redirections.input, None);
        assert_eq!(redirections.output, Some(PathBuf::from("sorted")));
    }

    #[test]
    fn output_is_created_and_truncated() {
        let path = scratch("out");
        std::fs::write(&path, "old contents that are longer\n").unwrap();

        let redirections = Redirections {
            input: None,
            output: Some(path.clone()),
        };
        let exit = in_child(|| {
            if redirections.apply().is_err() {
                return 1;
            }
            write_unbuffered(STDOUT_FILENO, b"new\n");
            0
        });
        assert_eq!(exit, Some(0));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        std::fs::remove_file(&path).unwrap();

        // a fresh file gets the output permissions
        let exit = in_child(|| {
            unsafe { libc::umask(0o022) };
            if redirections.apply().is_err() {
                return 1;
            }
            0
        });
        assert_eq!(exit, Some(0));
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o744);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn input_is_read_from_the_file() {
        let path = scratch("in");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"abc")
            .unwrap();

        let redirections = Redirections {
            input: Some(path.clone()),
            output: None,
        };
        let exit = in_child(|| {
            if redirections.apply().is_err() {
                return 1;
            }
            let mut buf = [0u8; 8];
            let read = unsafe { libc::read(STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
            if read == 3 && &buf[..3] == b"abc" {
                0
            } else {
                2
            }
        });
        assert_eq!(exit, Some(0));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_input_names_the_file() {
        let redirections = Redirections {
            input: Some(PathBuf::from("/no/such/input/file")),
            output: None,
        };
        let err = redirections.apply().unwrap_err();
        assert_eq!(err.direction, Direction::Input);
        assert_eq!(err.path, Path::new("/no/such/input/file"));
        assert!(err
            .to_string()
            .starts_with("cannot open /no/such/input/file for input: "));
    }

    #[test]
    fn missing_input_leaves_output_alone() {
        let output = scratch("untouched");
        let redirections = Redirections {
            input: Some(PathBuf::from("/no/such/input/file")),
            output: Some(output.clone()),
        };
        assert!(redirections.apply().is_err());
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_names_the_file() {
        let redirections = Redirections {
            input: None,
            output: Some(PathBuf::from("/no/such/dir/out")),
        };
        let err = redirections.apply().unwrap_err();
        assert_eq!(err.direction, Direction::Output);
        assert!(err
            .to_string()
            .starts_with("cannot open /no/such/dir/out for output: "));
    }
}
