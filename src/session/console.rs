//! Console message and exception queries.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

use crate::error::Result;
use crate::state::{CollectedException, ConsoleMessage};

use super::core::Session;

// ============================================================================
// Session - Console
// ============================================================================

impl Session {
    /// Enables the runtime domain, which also starts console collection.
    pub async fn enable_runtime(&self) -> Result<()> {
        self.send("Runtime.enable", None).await?;
        self.console.set_enabled(true);
        Ok(())
    }

    /// Disables the runtime domain and clears collected console state.
    pub async fn disable_runtime(&self) -> Result<()> {
        self.send("Runtime.disable", None).await?;
        self.console.set_enabled(false);
        Ok(())
    }

    /// Returns collected console messages, oldest first.
    #[must_use]
    pub fn console_messages(&self) -> Vec<ConsoleMessage> {
        self.console.messages()
    }

    /// Returns console messages of the given level.
    #[must_use]
    pub fn console_messages_by_level(&self, level: &str) -> Vec<ConsoleMessage> {
        self.console.messages_by_level(level)
    }

    /// Returns collected exceptions, oldest first.
    #[must_use]
    pub fn exceptions(&self) -> Vec<CollectedException> {
        self.console.exceptions()
    }

    /// Clears collected messages and exceptions.
    pub fn clear_console(&self) {
        self.console.clear();
    }

    /// Summarizes console state for tool output.
    #[must_use]
    pub fn console_summary(&self) -> Value {
        json!({
            "messageCount": self.console.message_count(),
            "errorCount": self.console.messages_by_level("error").len(),
            "exceptionCount": self.console.exception_count(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
