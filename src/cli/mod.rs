#![forbid(unsafe_code)]

pub mod help;


#[derive(Debug, Default, PartialEq, Clone)]
pub enum ShellAction {
    Help,
    Version,
    #[default]
    Run,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct ShellOptions {
    // resulting action enum
    pub action: ShellAction,
    // actions
    help: bool,
    version: bool,
}

impl ShellOptions {
    /// split combined shorthand flags, `-hV` becomes `-h -V`
    fn normalize_arguments<I>(iter: I) -> Result<Vec<String>, String>
    where
        I: IntoIterator<Item = String>,
    {
        // the first argument is the shell itself - so we can skip it
        let mut processed = vec![];

        for arg in iter.into_iter().skip(1) {
            match arg.as_str() {
                long_arg if long_arg.starts_with("--") => {
                    if let Some((key, _)) = long_arg.split_once('=') {
                        Err(format!("'{key}' does not take any arguments"))?;
                    }
                    processed.push(arg);
                }
                short_arg if short_arg.starts_with('-') && short_arg.len() > 1 => {
                    for char in short_arg[1..].chars() {
                        processed.push(format!("-{char}"));
                    }
                }
                argument => Err(format!("unexpected argument '{argument}'"))?,
            }
        }

        Ok(processed)
    }

    /// Parse the arguments this process was started with.
    pub fn from_env() -> Result<ShellOptions, String> {
        Self::try_parse_from(std::env::args())
    }

    /// Pick the action from the flags that were seen.
    fn resolve_action(&mut self) {
        if self.help {
            self.action = ShellAction::Help;
        } else if self.version {
            self.action = ShellAction::Version;
        } else {
            self.action = ShellAction::Run;
        }
    }

    pub fn try_parse_from<I, T>(iter: I) -> Result<ShellOptions, String>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut options: ShellOptions = ShellOptions::default();
        let arg_iter = Self::normalize_arguments(iter.into_iter().map(Into::into))?;

        for flag in arg_iter {
            match flag.as_str() {
                "-h" | "--help" => options.help = true,
                "-V" | "--version" => options.version = true,
                unknown => Err(format!("invalid option '{unknown}'"))?,
            }
        }

        options.resolve_action();

        Ok(options)
    }
}
