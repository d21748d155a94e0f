//! Run log files.
//!
//! [`FileLogLayer`] is a `tracing` layer that mirrors every event into
//! `<prefix>.log` and every error event into `<prefix>.error.log`. A
//! `detail` field is written below the message, indented.

use crate::config::{LogConfig, LogMode};
use crate::error::{Result, SyncError};
use chrono::Local;
use std::fmt::{self, Write as _};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const DETAIL_INDENT: &str = "        ";

struct LogFiles {
    log: File,
    error_log: File,
    error_path: PathBuf,
    errors: usize,
}

/// Layer writing the run log files.
#[derive(Clone)]
pub struct FileLogLayer {
    files: Arc<Mutex<LogFiles>>,
}

/// Finalizes the log files when the run is over.
pub struct FileLogGuard {
    files: Arc<Mutex<LogFiles>>,
}

/// Paths of the main and error log for a configuration.
pub fn log_paths(config: &LogConfig) -> (PathBuf, PathBuf) {
    let stem = match config.mode {
        LogMode::Rewrite => config.prefix.clone(),
        LogMode::Append => format!("{}.{}", config.prefix, Local::now().format("%Y%m%d-%H%M%S")),
    };
    (
        config.dir.join(format!("{}.log", stem)),
        config.dir.join(format!("{}.error.log", stem)),
    )
}

impl FileLogLayer {
    /// Create the log directory and open both files, truncating old ones.
    pub fn open(config: &LogConfig) -> Result<(Self, FileLogGuard)> {
        fs::create_dir_all(&config.dir)
            .map_err(|e| SyncError::Logging(format!("{}: {}", config.dir.display(), e)))?;

        let (log_path, error_path) = log_paths(config);
        let files = Arc::new(Mutex::new(LogFiles {
            log: create(&log_path)?,
            error_log: create(&error_path)?,
            error_path,
            errors: 0,
        }));

        Ok((
            Self {
                files: Arc::clone(&files),
            },
            FileLogGuard { files },
        ))
    }
}

fn create(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| SyncError::Logging(format!("{}: {}", path.display(), e)))
}

impl FileLogGuard {
    /// Number of error events logged so far.
    pub fn errors(&self) -> usize {
        self.files.lock().map(|f| f.errors).unwrap_or(0)
    }

    /// Flush both files and drop the error log if nothing went wrong.
    pub fn finish(self) -> Result<()> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| SyncError::Logging("log files lock poisoned".into()))?;
        files.log.flush()?;
        files.error_log.flush()?;
        if files.errors == 0 {
            match fs::remove_file(&files.error_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    detail: Option<String>,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "detail" => self.detail = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "detail" => self.detail = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// `[YYYY-MM-DD HH:MM:SS] [LEVEL] message` plus indented detail lines.
fn format_entry(timestamp: &str, level: &Level, fields: &EventFields) -> String {
    let mut entry = format!("[{}] [{}] {}\n", timestamp, level_label(level), fields.message);
    if let Some(detail) = &fields.detail {
        for line in detail.lines() {
            let _ = writeln!(entry, "{}{}", DETAIL_INDENT, line);
        }
    }
    entry
}

impl<S: Subscriber> Layer<S> for FileLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let level = event.metadata().level();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let entry = format_entry(&timestamp, level, &fields);

        // Logging must never fail the run.
        if let Ok(mut files) = self.files.lock() {
            let _ = files.log.write_all(entry.as_bytes());
            if *level == Level::ERROR {
                files.errors += 1;
                let _ = files.error_log.write_all(entry.as_bytes());
            }
        }
    }
}
