use self::simple_logger::SimpleLogger;

mod simple_logger;

macro_rules! logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => (::log::log!(target: $target, ::log::Level::$rule_level, $d($d arg)+));
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        logger_macro!($name is $rule_level to $target, $);
    };
}

logger_macro!(user_error is Error to "smallsh::user");
logger_macro!(user_warn is Warn to "smallsh::user");

macro_rules! dev_logger_macro {
    ($name:ident is $rule_level:ident to $target:expr, $d:tt) => {
        macro_rules! $name {
            ($d($d arg:tt)+) => {
                if std::cfg!(feature = "dev") {
                    (::log::log!(
                        target: $target,
                        ::log::Level::$rule_level,
                        "[{}] {}: {}",
                        std::process::id(),
                        std::panic::Location::caller(),
                        format_args!($d($d arg)+)
                    ));
                }
            };
        }

        pub(crate) use $name;
    };
    ($name:ident is $rule_level:ident to $target:expr) => {
        dev_logger_macro!($name is $rule_level to $target, $);
    };
}

dev_logger_macro!(dev_warn is Warn to "smallsh::dev");
dev_logger_macro!(dev_info is Info to "smallsh::dev");
dev_logger_macro!(dev_debug is Debug to "smallsh::dev");

/// One backend, receiving every record whose target is `target` or lies below it.
struct Route {
    target: String,
    backend: Box<dyn Log>,
}

impl Route {
    fn covers(&self, target: &str) -> bool {
        // `smallsh::user::x` is below `smallsh::user`, `smallsh::username` is not
        match target.strip_prefix(self.target.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }
}

/// Sends each `log` record to the backends registered for its target.
#[derive(Default)]
pub struct ShellLogger {
    routes: Vec<Route>,
}

impl ShellLogger {
    /// User-facing messages go to stderr behind `prefix`. With the `dev` feature, developer
    /// messages are appended to `$SMALLSH_DEV_LOGS` (set at build time) or a per-process file
    /// in the temporary directory.
    pub fn new(prefix: &'static str) -> Self {
        let mut logger = Self::default();
        logger.add_logger("smallsh::user", SimpleLogger::to_stderr(prefix));

        #[cfg(feature = "dev")]
        {
            let path = match option_env!("SMALLSH_DEV_LOGS") {
                Some(path) => std::path::PathBuf::from(path),
                None => std::env::temp_dir().join(format!("smallsh-dev-{}.log", std::process::id())),
            };
            // forked children share the file; each dev line starts with the writer's pid
            if let Ok(file_logger) = SimpleLogger::to_file(path, "") {
                logger.add_logger("smallsh::dev", file_logger);
            }
        }

        logger
    }

    /// Install as the process-wide `log` backend. Returns `false` if one was installed already.
    pub fn into_global_logger(self) -> bool {
        log::set_boxed_logger(Box::new(self))
            .map(|()| log::set_max_level(log::LevelFilter::Trace))
            .is_ok()
    }

    fn add_logger(&mut self, target: impl Into<String>, backend: impl Log + 'static) {
        let mut target = target.into();
        if target.ends_with("::") {
            target.truncate(target.len() - 2);
        }
        self.routes.push(Route {
            target,
            backend: Box::new(backend),
        });
    }
}

impl log::Log for ShellLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.level() <= log::STATIC_MAX_LEVEL
    }

    fn log(&self, record: &log::Record) {
        self.routes
            .iter()
            .filter(|route| route.covers(record.target()))
            .for_each(|route| route.backend.log(record));
    }

    fn flush(&self) {
        self.routes.iter().for_each(|route| route.backend.flush());
    }
}

/// Object-safe subset of [`log::Log`] used for the boxed backends.
trait Log: Send + Sync {
    fn log(&self, record: &log::Record);
    fn flush(&self);
}

impl<T: log::Log> Log for T {
    fn log(&self, record: &log::Record) {
        log::Log::log(self, record)
    }

    fn flush(&self) {
        log::Log::flush(self)
    }
}
