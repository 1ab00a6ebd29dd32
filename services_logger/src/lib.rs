#![no_std]

//! # Logger Service
//!
//! Structured diagnostics for Marquee.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Non-fatal failures (a surface label that resolves to no script, for
//! example) are reported here and execution continues; nothing in the
//! page ever panics over a diagnostic.

extern crate alloc;

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// Maximum number of entries the buffer retains
const MAX_LOG_HISTORY: usize = 256;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Source component (if known)
    pub source: Option<String>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates an error entry
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Creates a warning entry
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    /// Creates an info entry
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Sets the source component
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a structured field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Bounded in-memory log buffer
///
/// Keeps the most recent [`MAX_LOG_HISTORY`] entries; older entries are
/// dropped silently.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    /// Creates an empty buffer
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Appends an entry, evicting the oldest if at capacity
    pub fn log(&mut self, entry: LogEntry) {
        if self.entries.len() == MAX_LOG_HISTORY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over retained entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Returns the most recent `count` entries, oldest first
    pub fn recent(&self, count: usize) -> Vec<&LogEntry> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).collect()
    }

    /// Returns entries at or above the given level, oldest first
    pub fn at_least(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.level >= level)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_entry_creation() {
        let entry = LogEntry::new(LogLevel::Info, "test message");
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, "test message");
        assert!(entry.source.is_none());
        assert!(entry.fields.is_empty());
    }

    #[test]
    fn test_log_entry_with_source() {
        let entry = LogEntry::error("bad binding").with_source("typewriter");
        assert_eq!(entry.source.as_deref(), Some("typewriter"));
        assert_eq!(entry.level, LogLevel::Error);
    }

    #[test]
    fn test_log_entry_with_fields() {
        let entry = LogEntry::info("bound")
            .with_field("label", "twtxt0")
            .with_field("index", "0");

        assert_eq!(entry.fields.len(), 2);
        assert_eq!(entry.fields[0].0, "label");
        assert_eq!(entry.fields[1].1, "0");
    }

    #[test]
    fn test_buffer_retains_entries() {
        let mut buffer = LogBuffer::new();
        buffer.log(LogEntry::info("one"));
        buffer.log(LogEntry::warn("two"));

        assert_eq!(buffer.len(), 2);
        let messages: Vec<&str> = buffer.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut buffer = LogBuffer::new();
        for i in 0..MAX_LOG_HISTORY + 10 {
            buffer.log(LogEntry::info(alloc::format!("entry {}", i)));
        }

        assert_eq!(buffer.len(), MAX_LOG_HISTORY);
        assert_eq!(buffer.entries().next().unwrap().message, "entry 10");
    }

    #[test]
    fn test_recent() {
        let mut buffer = LogBuffer::new();
        buffer.log(LogEntry::info("a"));
        buffer.log(LogEntry::info("b"));
        buffer.log(LogEntry::info("c"));

        let recent: Vec<&str> = buffer
            .recent(2)
            .into_iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(recent, vec!["b", "c"]);
    }

    #[test]
    fn test_at_least_filters_by_level() {
        let mut buffer = LogBuffer::new();
        buffer.log(LogEntry::info("fine"));
        buffer.log(LogEntry::error("broken"));
        buffer.log(LogEntry::warn("odd"));

        let serious: Vec<&str> = buffer
            .at_least(LogLevel::Warn)
            .into_iter()
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(serious, vec!["broken", "odd"]);
    }
}
