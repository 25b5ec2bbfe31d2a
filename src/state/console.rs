//! Console message and exception projection.
//!
//! Stores flattened console API calls and uncaught exceptions in two bounded
//! lists. Argument flattening renders primitives literally, objects by their
//! `description`, and everything else as `[type]`.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Default capacity of each bounded list.
pub(crate) const DEFAULT_MAX_MESSAGES: usize = 1000;

// ============================================================================
// ConsoleMessage
// ============================================================================

/// A flattened console API call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMessage {
    /// Sequence number within the session.
    pub id: u64,
    /// Severity level (`log`, `info`, `warning`, `error`, `debug`).
    pub level: String,
    /// Original console call type (`log`, `table`, `assert`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Flattened argument text.
    pub text: String,
    /// Call site, when a stack trace was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// Raw argument remote objects.
    pub args: Vec<Value>,
    /// Call timestamp.
    pub timestamp: f64,
}

// ============================================================================
// CollectedException
// ============================================================================

/// A stored uncaught exception.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedException {
    /// Sequence number within the session.
    pub id: u64,
    /// Short exception text.
    pub text: String,
    /// Complete exception details payload.
    pub details: Value,
    /// Throw timestamp.
    pub timestamp: f64,
}

// ============================================================================
// ConsoleState
// ============================================================================

/// Runtime console projection.
#[derive(Debug)]
pub struct ConsoleState {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    enabled: bool,
    max_messages: usize,
    next_id: u64,
    messages: VecDeque<ConsoleMessage>,
    exceptions: VecDeque<CollectedException>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

impl ConsoleState {
    /// Creates a projection bounded at `max_messages` entries per list.
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                enabled: false,
                max_messages: max_messages.max(1),
                next_id: 1,
                messages: VecDeque::new(),
                exceptions: VecDeque::new(),
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mirrors the CDP domain enabled flag. Disabling clears both lists.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.messages.clear();
            inner.exceptions.clear();
        }
    }

    /// Returns whether the domain is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Clears both lists.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.messages.clear();
        inner.exceptions.clear();
    }

    /// Clears everything and resets the enabled flag and counter.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.messages.clear();
        inner.exceptions.clear();
        inner.next_id = 1;
        inner.enabled = false;
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    /// Records a `consoleAPICalled` event.
    pub fn on_console_api_called(
        &self,
        kind: String,
        args: Vec<Value>,
        timestamp: f64,
        stack_trace: Option<Value>,
    ) {
        let text = flatten_args(&args);
        let level = level_for_type(&kind);
        let location = stack_trace
            .as_ref()
            .and_then(|st| st.get("callFrames"))
            .and_then(Value::as_array)
            .and_then(|frames| frames.first())
            .cloned();

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        inner.messages.push_back(ConsoleMessage {
            id,
            level: level.to_string(),
            kind,
            text,
            location,
            args,
            timestamp,
        });
        if inner.messages.len() > inner.max_messages {
            inner.messages.pop_front();
        }
    }

    /// Records an `exceptionThrown` event.
    pub fn on_exception_thrown(&self, timestamp: f64, details: Value) {
        let text = exception_text(&details);

        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        inner.exceptions.push_back(CollectedException {
            id,
            text,
            details,
            timestamp,
        });
        if inner.exceptions.len() > inner.max_messages {
            inner.exceptions.pop_front();
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns all stored messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.inner.lock().messages.iter().cloned().collect()
    }

    /// Returns messages of the given level.
    #[must_use]
    pub fn messages_by_level(&self, level: &str) -> Vec<ConsoleMessage> {
        self.inner
            .lock()
            .messages
            .iter()
            .filter(|m| m.level == level)
            .cloned()
            .collect()
    }

    /// Returns all stored exceptions, oldest first.
    #[must_use]
    pub fn exceptions(&self) -> Vec<CollectedException> {
        self.inner.lock().exceptions.iter().cloned().collect()
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner.lock().messages.len()
    }

    /// Returns the number of stored exceptions.
    #[must_use]
    pub fn exception_count(&self) -> usize {
        self.inner.lock().exceptions.len()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Maps a console call type to a severity level.
fn level_for_type(kind: &str) -> &'static str {
    match kind {
        "error" | "assert" => "error",
        "warning" => "warning",
        "debug" => "debug",
        "info" => "info",
        _ => "log",
    }
}

/// Flattens remote-object arguments into one line of text.
fn flatten_args(args: &[Value]) -> String {
    args.iter()
        .map(flatten_arg)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders one remote object.
fn flatten_arg(arg: &Value) -> String {
    let kind = arg.get("type").and_then(Value::as_str).unwrap_or("object");

    if kind == "undefined" {
        return "undefined".to_string();
    }

    if let Some(value) = arg.get("value") {
        return match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }

    if let Some(description) = arg.get("description").and_then(Value::as_str) {
        return description.to_string();
    }

    format!("[{kind}]")
}

/// Extracts a short text from exception details.
fn exception_text(details: &Value) -> String {
    details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("Uncaught exception")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
