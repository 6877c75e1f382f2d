//! Per-run log with two sinks: every line goes to the detail sink (the run's
//! log file), and lines accepted by the summary filter also go to the summary
//! sink (the console). Passed explicitly to whatever needs to log.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use tracing::warn;

use crate::error::MediaError;

const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

type Sink = Mutex<Box<dyn Write + Send>>;
type SummaryFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

/// Only the START/END bracket of a run reaches the console by default.
pub fn is_start_or_end(message: &str) -> bool {
    message.starts_with("START ") || message.starts_with("END ")
}

pub struct RunLog {
    detail: Sink,
    summary: Sink,
    summary_filter: SummaryFilter,
}

impl RunLog {
    pub fn new(detail: impl Write + Send + 'static, summary: impl Write + Send + 'static) -> Self {
        Self {
            detail: Mutex::new(Box::new(detail)),
            summary: Mutex::new(Box::new(summary)),
            summary_filter: Box::new(is_start_or_end),
        }
    }

    /// Log to `path` (parent directories are created) with stderr as the
    /// summary sink.
    pub fn to_file(path: &Path) -> Result<Self, MediaError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MediaError::io(format!("Failed to create log dir {}", parent.display()), e)
            })?;
        }
        let file = File::create(path)
            .map_err(|e| MediaError::io(format!("Failed to create {}", path.display()), e))?;
        Ok(Self::new(file, io::stderr()))
    }

    pub fn with_summary_filter(
        mut self,
        filter: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.summary_filter = Box::new(filter);
        self
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message.as_ref());
    }

    pub fn log(&self, level: Level, message: &str) {
        let line = format!(
            "{} {} {message}",
            Local::now().format(LINE_TIMESTAMP_FORMAT),
            level.as_str()
        );

        write_line(&self.detail, &line);
        if (self.summary_filter)(message) {
            write_line(&self.summary, &line);
        }
    }
}

fn write_line(sink: &Sink, line: &str) {
    let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = writeln!(sink, "{line}").and_then(|_| sink.flush()) {
        warn!("Failed to write run log line: {e}");
    }
}

/// In-memory sink whose contents stay readable after it's handed to a
/// [`RunLog`]. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Messages without the timestamp and level prefix.
    pub fn messages(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter_map(|line| line.splitn(4, ' ').nth(3))
            .map(str::to_string)
            .collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
