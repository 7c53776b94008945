//! User-visible log panel.
//!
//! Every entry is timestamped and mirrored to `tracing`. Entries raised
//! with [`LogPanel::alert`] are the blocking alerts shown for upload and
//! extraction failures.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Also raised as a blocking alert
    pub alert: bool,
}

impl LogEntry {
    /// `[2024-05-01T12:00:00.000Z] message`
    pub fn line(&self) -> String {
        format!(
            "[{}] {}",
            self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.message
        )
    }
}

#[derive(Debug, Default)]
pub struct LogPanel {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!(target: "preproc_viewer::panel", "{}", message);
        self.push(LogLevel::Info, message, false);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(target: "preproc_viewer::panel", "{}", message);
        self.push(LogLevel::Warn, message, false);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        error!(target: "preproc_viewer::panel", "{}", message);
        self.push(LogLevel::Error, message, false);
    }

    /// Error that is also shown as a blocking alert
    pub fn alert(&self, message: impl Into<String>) {
        let message = message.into();
        error!(target: "preproc_viewer::panel", alert = true, "{}", message);
        self.push(LogLevel::Error, message, true);
    }

    fn push(&self, level: LogLevel, message: String, alert: bool) {
        self.entries.lock().push(LogEntry {
            at: Utc::now(),
            level,
            message,
            alert,
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.alert)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Whether any entry contains `needle`
    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Panel contents, one line per entry, oldest first
    pub fn render(&self) -> String {
        self.entries
            .lock()
            .iter()
            .map(LogEntry::line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
