//! User-facing reporting.
//!
//! The session reports to two sinks: a [`Notifier`], which stands in for whatever shows short messages to the user
//! (toasts, a status line, the console), and an [`ActivityLog`], an append-only, timestamped record of every
//! operation, channel event and push message.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use log::*;

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true), self.line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<S: Into<String>>(&mut self, line: S) {
        let entry = LogEntry { timestamp: Utc::now(), line: line.into() };
        info!("📝️ {}", entry.line);
        self.entries.push(entry);
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.entries.iter().any(|e| e.line.contains(fragment))
    }

    /// Renders the log newest-first, one entry per line.
    pub fn render(&self) -> String {
        self.entries.iter().rev().map(|e| format!("{e}\n")).collect()
    }
}
