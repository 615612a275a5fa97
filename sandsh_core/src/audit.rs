//! # Audit Log
//!
//! Append-only record of every command a session issues. The sink is opened
//! once at startup, receives one [`LogRecord`] per processed command in order,
//! and is closed exactly once when the session ends.
//!
//! [`CsvAuditLog`] writes a `timestamp,user,command` header followed by one
//! CSV row per record. Fields containing separators, quotes or line breaks are
//! quoted with embedded quotes doubled.

use chrono::{DateTime, Local};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER: [&str; 3] = ["timestamp", "user", "command"];

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log is already closed")]
    Closed,

    #[error("audit log I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// One issued command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub identity: String,
    pub command: String,
}

impl LogRecord {
    pub fn now(identity: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            identity: identity.into(),
            command: command.into(),
        }
    }
}

/// Destination for audit records.
pub trait LogSink {
    fn record(&mut self, record: &LogRecord) -> Result<(), AuditError>;

    /// Flushes and releases the sink. Any later call fails with
    /// [`AuditError::Closed`].
    fn close(&mut self) -> Result<(), AuditError>;
}

/// CSV audit log over any writer.
#[derive(Debug)]
pub struct CsvAuditLog<W: Write> {
    writer: Option<W>,
}

impl CsvAuditLog<BufWriter<File>> {
    /// Creates (truncating) the log file at `path` and writes the header.
    pub fn create(path: &Path) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> CsvAuditLog<W> {
    pub fn new(mut writer: W) -> Result<Self, AuditError> {
        write_row(&mut writer, &HEADER)?;
        Ok(Self {
            writer: Some(writer),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Closes the log and hands back the underlying writer.
    pub fn into_inner(mut self) -> Result<W, AuditError> {
        let mut writer = self.writer.take().ok_or(AuditError::Closed)?;
        writer.flush()?;
        Ok(writer)
    }
}

impl<W: Write> LogSink for CsvAuditLog<W> {
    fn record(&mut self, record: &LogRecord) -> Result<(), AuditError> {
        let writer = self.writer.as_mut().ok_or(AuditError::Closed)?;
        let timestamp = record.timestamp.format(TIMESTAMP_FORMAT).to_string();
        write_row(
            writer,
            &[timestamp.as_str(), record.identity.as_str(), record.command.as_str()],
        )?;
        // Keep the file current in case the process is killed mid-session.
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), AuditError> {
        let mut writer = self.writer.take().ok_or(AuditError::Closed)?;
        writer.flush()?;
        Ok(())
    }
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    writeln!(writer, "{}", row.join(","))
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
