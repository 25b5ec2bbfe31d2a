//! Error types for the session engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_debugger::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     session.set_breakpoint_by_url("http://x/app.js", 12, None, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::ChromeNotFound`], [`Error::ProcessLaunchFailed`] |
//! | Connection | [`Error::NotConnected`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Decode`], [`Error::RequestTimeout`] |
//! | Debugger | [`Error::AlreadyPaused`], [`Error::NotPaused`], [`Error::BreakpointSpecInvalid`] |
//! | Interception | [`Error::PausedRequestNotFound`], [`Error::RuleNotFound`] |
//! | Lookup | [`Error::TargetNotFound`], [`Error::ScriptNotFound`], [`Error::ResponseBodyUnavailable`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{CallId, RequestId, ScriptId, TargetId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when session or launch configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// No Chrome executable could be located.
    ///
    /// Returned when `find_chrome()` yields nothing and no explicit path
    /// was configured.
    #[error("No Chrome executable found; set an explicit path")]
    ChromeNotFound,

    /// Failed to launch the Chrome process.
    #[error("Failed to launch Chrome: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Operation attempted without an established connection.
    #[error("Not connected to a browser")]
    NotConnected,

    /// Connection (or endpoint discovery) timed out.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed.
    ///
    /// Every in-flight command fails with this when the socket goes away.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Error response from Chrome's own `error` field.
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// CDP error code.
        code: i64,
        /// CDP error message.
        message: String,
        /// Optional error payload.
        data: Option<Value>,
    },

    /// Inbound frame was not valid JSON or not a recognizable message.
    ///
    /// The transport logs and drops such frames; this variant surfaces only
    /// from explicit decode paths.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the decode failure.
        message: String,
    },

    /// Command did not receive a response within its deadline.
    #[error("Request {call_id} ({method}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The command method name.
        method: String,
        /// The call ID that timed out.
        call_id: CallId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Debugger Errors
    // ========================================================================
    /// Evaluate was requested while execution is already paused.
    ///
    /// Evaluation in a paused isolate must target a call frame via
    /// `evaluate_on_frame` instead.
    #[error("Execution is already paused ({reason}); use evaluate_on_frame")]
    AlreadyPaused {
        /// The pause reason reported by Chrome.
        reason: String,
    },

    /// Step/frame operation requested while execution is not paused.
    #[error("Execution is not paused")]
    NotPaused,

    /// Breakpoint specification named neither `url` nor `url_regex`.
    #[error("Breakpoint spec invalid: either url or url_regex is required")]
    BreakpointSpecInvalid,

    // ========================================================================
    // Interception Errors
    // ========================================================================
    /// Dispatch operation on a request ID absent from the paused table.
    #[error("No paused request with id {request_id}")]
    PausedRequestNotFound {
        /// The unknown request ID.
        request_id: RequestId,
    },

    /// Rule lookup by an unknown rule ID.
    #[error("No intercept rule with id {rule_id}")]
    RuleNotFound {
        /// The unknown rule ID.
        rule_id: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// Target ID not present in the endpoint's target list.
    #[error("Target not found: {target_id}")]
    TargetNotFound {
        /// The missing target ID.
        target_id: TargetId,
    },

    /// Script ID not present in the registry.
    #[error("Script not found: {script_id}")]
    ScriptNotFound {
        /// The missing script ID.
        script_id: ScriptId,
    },

    /// Response body is not retrievable for this request.
    #[error("Response body unavailable for request {request_id}")]
    ResponseBodyUnavailable {
        /// The request whose body is unavailable.
        request_id: RequestId,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel receive error.
    #[error("Connection closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error from Chrome's error payload.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
            data,
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(method: impl Into<String>, call_id: CallId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            method: method.into(),
            call_id,
            timeout_ms,
        }
    }

    /// Creates an already-paused error.
    #[inline]
    pub fn already_paused(reason: impl Into<String>) -> Self {
        Self::AlreadyPaused {
            reason: reason.into(),
        }
    }

    /// Creates a paused-request-not-found error.
    #[inline]
    pub fn paused_request_not_found(request_id: RequestId) -> Self {
        Self::PausedRequestNotFound { request_id }
    }

    /// Creates a rule-not-found error.
    #[inline]
    pub fn rule_not_found(rule_id: impl Into<String>) -> Self {
        Self::RuleNotFound {
            rule_id: rule_id.into(),
        }
    }

    /// Creates a target-not-found error.
    #[inline]
    pub fn target_not_found(target_id: TargetId) -> Self {
        Self::TargetNotFound { target_id }
    }

    /// Creates a script-not-found error.
    #[inline]
    pub fn script_not_found(script_id: ScriptId) -> Self {
        Self::ScriptNotFound { script_id }
    }

    /// Creates a response-body-unavailable error.
    #[inline]
    pub fn response_body_unavailable(request_id: RequestId) -> Self {
        Self::ResponseBodyUnavailable { request_id }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::ChannelClosed(_)
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error originated from Chrome's `error` field.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns `true` if the debugger pause state caused this error.
    #[inline]
    #[must_use]
    pub fn is_pause_state_error(&self) -> bool {
        matches!(self, Self::AlreadyPaused { .. } | Self::NotPaused)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::protocol(-32000, "Cannot find context", None);
        assert_eq!(
            err.to_string(),
            "Protocol error -32000: Cannot find context"
        );
    }

    #[test]
    fn test_request_timeout_display() {
        let err = Error::request_timeout("Runtime.evaluate", CallId::new(9), 30_000);
        assert_eq!(
            err.to_string(),
            "Request 9 (Runtime.evaluate) timed out after 30000ms"
        );
    }

    #[test]
    fn test_already_paused_display() {
        let err = Error::already_paused("breakpoint");
        assert!(err.to_string().contains("breakpoint"));
        assert!(err.is_pause_state_error());
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::connection_timeout(5000);
        let other_err = Error::config("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(Error::connection_timeout(1000).is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_paused_request_not_found() {
        let err = Error::paused_request_not_found(RequestId::new("interception-7"));
        assert_eq!(err.to_string(), "No paused request with id interception-7");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
