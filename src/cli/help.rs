pub const USAGE_MSG: &str = "usage: smallsh [-h | -V]";

const DESCRIPTOR: &str = "smallsh - a small interactive shell";

const HELP_MSG: &str = "Options:
  -h, --help                    display help message and exit
  -V, --version                 display version information and exit

Built-in commands:
  exit                          leave the shell
  cd [directory]                change the working directory, HOME by default
  status                        show how the last foreground command ended

Command lines have the form
  command [arg ...] [< input_file] [> output_file] [&]
where a trailing & runs the command in the background and $$ expands to the
shell's process ID. Lines starting with # are comments.

SIGINT is ignored by the shell; SIGTSTP toggles foreground-only mode.";

pub fn long_help_message() -> String {
    format!("{DESCRIPTOR}\n{USAGE_MSG}\n{HELP_MSG}")
}
