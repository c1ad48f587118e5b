use std::{fmt, path::PathBuf};

use crate::system::interface::ProcessId;

/// Lines longer than this many bytes are not executed.
pub const MAX_LINE_LENGTH: usize = 2048;
/// Commands with more arguments than this are not executed.
pub const MAX_ARGUMENTS: usize = 512;

const BACKGROUND: &str = "&";
const INPUT: &str = "<";
const OUTPUT: &str = ">";
const PID_VARIABLE: &str = "$$";

/// A single command line, split into the program's arguments and the shell's own directives.
///
/// `arguments` never contains the redirection operators, their paths or the background marker;
/// it is exactly the argument vector handed to the program.
#[derive(Debug, Default, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct CommandSpec {
    pub(crate) arguments: Vec<String>,
    pub(crate) background: bool,
    pub(crate) input: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    LineTooLong(usize),
    TooManyArguments(usize),
    MissingPath(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LineTooLong(len) => {
                write!(f, "line is {len} bytes long, the limit is {MAX_LINE_LENGTH}")
            }
            ParseError::TooManyArguments(count) => {
                write!(f, "{count} arguments given, the limit is {MAX_ARGUMENTS}")
            }
            ParseError::MissingPath(operator) => {
                write!(f, "expected a path after '{operator}'")
            }
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arguments.join(" "))?;
        if let Some(input) = &self.input {
            write!(f, " < {}", input.display())?;
        }
        if let Some(output) = &self.output {
            write!(f, " > {}", output.display())?;
        }
        if self.background {
            f.write_str(" &")?;
        }
        Ok(())
    }
}

// replace every `$$` with the pid, scanning left to right without overlap
fn expand_pid(token: &str, pid: &str) -> String {
    token.replace(PID_VARIABLE, pid)
}

impl CommandSpec {
    /// Split one input line into a command.
    ///
    /// Returns `Ok(None)` for lines that do nothing: blank lines, comments, and lines that consist
    /// only of shell directives.
    pub fn parse(line: &str, shell_pid: ProcessId) -> Result<Option<Self>, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() > MAX_LINE_LENGTH {
            return Err(ParseError::LineTooLong(line.len()));
        }

        let mut tokens = line.split_ascii_whitespace().peekable();
        match tokens.peek() {
            None => return Ok(None),
            Some(first) if first.starts_with('#') => return Ok(None),
            Some(_) => {}
        }

        let pid = shell_pid.to_string();
        let mut spec = CommandSpec::default();

        while let Some(token) = tokens.next() {
            match token {
                INPUT | OUTPUT => {
                    let operator = if token == INPUT { INPUT } else { OUTPUT };
                    let path = tokens
                        .next()
                        .ok_or(ParseError::MissingPath(operator))?;
                    let path = PathBuf::from(expand_pid(path, &pid));
                    if operator == INPUT {
                        spec.input = Some(path);
                    } else {
                        spec.output = Some(path);
                    }
                }
                BACKGROUND if tokens.peek().is_none() => spec.background = true,
                argument => spec.arguments.push(expand_pid(argument, &pid)),
            }
        }

        if spec.arguments.len() > MAX_ARGUMENTS {
            return Err(ParseError::TooManyArguments(spec.arguments.len()));
        }

        if spec.arguments.is_empty() {
            return Ok(None);
        }

        Ok(Some(spec))
    }

    /// The program name, i.e. the first argument.
    pub fn program(&self) -> &str {
        // `parse` never produces a spec without arguments
        self.arguments.first().map(String::as_str).unwrap_or_default()
    }
}
