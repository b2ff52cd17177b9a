//! Process-wide diagnostic sink.
//!
//! One `LogCollector` is created at startup, registered as the `log` crate's
//! global logger and handed to the executor and sequencer as an
//! `Arc<LogCollector>`.
//!
//! # Architecture
//!
//! ```text
//! log::info!/warn!/error!      executor captured output
//!        |                              |
//!   [LogCollector] -- console (colored, stderr)
//!        |
//!        | (crossbeam unbounded channel)
//!        v
//!   [DiskPersister thread]
//!        |
//!   logs/full/<ts>_full.log      every record
//!   logs/parsed/<ts>_parsed.log  target "parsed" only
//! ```

use chrono::Local;
use colored::Colorize;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Log target for high-level milestones (step transitions, workflow result).
pub const PARSED_TARGET: &str = "parsed";

/// Which log files a line is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Detailed log only
    Full,
    /// Detailed log and the milestone log
    Parsed,
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub kind: LogKind,
    /// Wall-clock time the line was produced (HH:MM:SS.mmm)
    pub timestamp: String,
}

impl LogLine {
    pub fn new(message: String) -> Self {
        LogLine {
            message,
            kind: LogKind::Full,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(message: String) -> Self {
        LogLine {
            kind: LogKind::Parsed,
            ..LogLine::new(message)
        }
    }
}

enum LogMessage {
    Line(LogLine),
    /// Flush marker; the persister answers once everything before it is on disk
    Flush(std::sync::mpsc::Sender<()>),
}

/// Unified logger that handles console rendering and disk persistence
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    console: bool,
    full_log_path: PathBuf,
}

impl LogCollector {
    /// Create the collector and its disk persister thread.
    ///
    /// `console` controls whether `log` records are also rendered to stderr.
    pub fn new(log_dir: PathBuf, console: bool) -> io::Result<Self> {
        let full_log_dir = log_dir.join("full");
        let parsed_log_dir = log_dir.join("parsed");
        std::fs::create_dir_all(&full_log_dir)?;
        std::fs::create_dir_all(&parsed_log_dir)?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let full_log_path = full_log_dir.join(format!("{}_full.log", stamp));
        let parsed_log_path = parsed_log_dir.join(format!("{}_parsed.log", stamp));

        let mut full_file = open_append(&full_log_path)?;
        let mut parsed_file = open_append(&parsed_log_path)?;

        let (tx, rx) = unbounded::<LogMessage>();

        // Plain OS thread: log calls come from blocking step code and from the
        // executor's runtime alike.
        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let formatted = format!("[{}] {}\n", line.timestamp, line.message);
                        let _ = full_file.write_all(formatted.as_bytes());
                        if line.kind == LogKind::Parsed {
                            let _ = parsed_file.write_all(formatted.as_bytes());
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = full_file.flush();
                        let _ = parsed_file.flush();
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector {
            tx,
            console,
            full_log_path,
        })
    }

    /// Register a clone of this collector as the global `log` backend.
    pub fn install(&self, max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone())).map(|()| log::set_max_level(max_level))
    }

    /// Path of this session's detailed log file
    pub fn full_log_path(&self) -> &Path {
        &self.full_log_path
    }

    /// Send a log line to disk (non-blocking, never fails)
    pub fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Write a detailed line to disk only
    pub fn log_str(&self, message: impl Into<String>) {
        self.log_line(LogLine::new(message.into()));
    }

    /// Write a milestone line to disk only
    pub fn log_parsed(&self, message: impl Into<String>) {
        self.log_line(LogLine::parsed(message.into()));
    }

    /// Block until every line sent before this call has been written.
    pub fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.recv()
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }

    fn render_console(&self, record: &Record) {
        let message = record.args().to_string();
        let message = match record.level() {
            Level::Error => message.red(),
            Level::Warn => message.yellow(),
            Level::Info => message.green(),
            Level::Debug | Level::Trace => message.normal(),
        };
        eprintln!(
            "{} - {} - {} - {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.target(),
            record.level(),
            message
        );
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if self.console {
            self.render_console(record);
        }

        let message = format!("[{}] {}", record.level(), record.args());
        if record.target() == PARSED_TARGET {
            self.log_parsed(message);
        } else {
            self.log_str(message);
        }
    }

    fn flush(&self) {
        let _ = self.wait_for_empty();
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
