use std::{
    io::{self, Write},
    sync::Mutex,
};

#[cfg(feature = "dev")]
use std::{fs::File, path::Path};

/// Writes each record as one line: prefix, `warning: ` for warnings, then the message.
pub struct SimpleLogger<W: Write + Send> {
    sink: Mutex<W>,
    prefix: &'static str,
}

impl<W: Write + Send> SimpleLogger<W> {
    fn new(sink: W, prefix: &'static str) -> Self {
        Self {
            sink: Mutex::new(sink),
            prefix,
        }
    }

    fn format(&self, record: &log::Record) -> String {
        let tag = match record.level() {
            log::Level::Warn => "warning: ",
            _ => "",
        };
        format!("{}{tag}{}\n", self.prefix, record.args())
    }
}

impl<W: Write + Send> log::Log for SimpleLogger<W> {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        // a single write per line, children share the descriptor and must not split our lines
        let line = self.format(record);
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }
}

impl SimpleLogger<io::Stderr> {
    pub fn to_stderr(prefix: &'static str) -> Self {
        Self::new(io::stderr(), prefix)
    }
}

#[cfg(feature = "dev")]
impl SimpleLogger<File> {
    /// Append to `path`, creating it if needed.
    pub fn to_file(path: impl AsRef<Path>, prefix: &'static str) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(file, prefix))
    }
}
