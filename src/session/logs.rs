//! Bounded browser log buffer.
//!
//! Stores `Log.entryAdded` events in a ring; the oldest entry leaves when
//! the buffer is full.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

// ============================================================================
// LogEntry
// ============================================================================

/// One browser log entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log source (`javascript`, `network`, `security`, …).
    pub source: String,
    /// Severity level.
    pub level: String,
    /// Entry text.
    pub text: String,
    /// Entry timestamp.
    pub timestamp: f64,
    /// Associated URL, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ============================================================================
// LogBuffer
// ============================================================================

/// Bounded ring of log entries.
#[derive(Debug)]
pub(crate) struct LogBuffer {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    capacity: usize,
    entries: VecDeque<LogEntry>,
}

impl LogBuffer {
    /// Creates a buffer bounded at `capacity` entries.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(1),
                entries: VecDeque::new(),
            }),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub(crate) fn push(&self, entry: LogEntry) {
        let mut inner = self.inner.lock();
        inner.entries.push_back(entry);
        if inner.entries.len() > inner.capacity {
            inner.entries.pop_front();
        }
    }

    /// Returns all entries, oldest first.
    pub(crate) fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Returns the number of buffered entries.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Clears the buffer.
    pub(crate) fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> LogEntry {
        LogEntry {
            source: "javascript".to_string(),
            level: "info".to_string(),
            text: text.to_string(),
            timestamp: 1.0,
            url: None,
        }
    }

    #[test]
    fn test_push_and_read() {
        let buffer = LogBuffer::new(10);
        buffer.push(entry("a"));
        buffer.push(entry("b"));

        let entries = buffer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "a");
    }

    #[test]
    fn test_oldest_out_when_full() {
        let buffer = LogBuffer::new(3);
        for text in ["a", "b", "c", "d", "e"] {
            buffer.push(entry(text));
        }

        let texts: Vec<String> = buffer.entries().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["c", "d", "e"]);
    }

    #[test]
    fn test_clear() {
        let buffer = LogBuffer::new(3);
        buffer.push(entry("a"));
        buffer.clear();
        assert_eq!(buffer.len(), 0);
    }
}
