//! Session configuration.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SessionConfig
// ============================================================================

/// Tunable knobs for a [`super::Session`].
///
/// # Example
///
/// ```ignore
/// let config = SessionConfig {
///     timeout: Duration::from_secs(10),
///     ..SessionConfig::default()
/// };
/// let session = Session::new(config);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for each protocol call.
    pub timeout: Duration,

    /// Capacity of the network request table.
    pub max_requests: usize,

    /// Capacity of the console message and exception lists.
    pub max_console_messages: usize,

    /// Capacity of the browser log buffer.
    pub max_log_entries: usize,

    /// How long a side-effecting operation waits for a pause after its
    /// response. A late pause still lands in the debug state.
    pub pause_detection_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_requests: 1000,
            max_console_messages: 1000,
            max_log_entries: 1000,
            pause_detection_window: Duration::from_millis(200),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_requests, 1000);
        assert_eq!(config.max_console_messages, 1000);
        assert_eq!(config.max_log_entries, 1000);
        assert_eq!(config.pause_detection_window, Duration::from_millis(200));
    }
}
