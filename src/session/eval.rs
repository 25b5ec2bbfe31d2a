//! Pause-aware evaluation.
//!
//! When the debugger is enabled, any JavaScript the engine runs may hit a
//! breakpoint. Chrome then withholds the evaluate response until execution
//! resumes, so a caller waiting synchronously would deadlock. The facade
//! races the outstanding call against the next pause notification and
//! reports whichever wins; the transport keeps draining the late response
//! after a pause wins, so no correlation slot is orphaned.
//!
//! Side-effecting operations that can trigger a pause *after* their own
//! response use a detection window instead: await the response, then wait
//! briefly for a pause. The window length is policy; a pause that misses it
//! still lands in the debug state.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::CallFrame;

use super::core::Session;
use super::router::PauseNotice;

// ============================================================================
// EvaluateOptions
// ============================================================================

/// Options for [`Session::evaluate`].
#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    /// Resolve returned promises before reporting the result.
    pub await_promise: bool,
    /// Request the result by value rather than as a remote object handle.
    pub return_by_value: bool,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            await_promise: true,
            return_by_value: true,
        }
    }
}

// ============================================================================
// EvaluateOutcome
// ============================================================================

/// Result of a pause-aware evaluation.
#[derive(Debug, Clone)]
pub enum EvaluateOutcome {
    /// The call completed; execution is running.
    Value {
        /// Remote object describing the result.
        result: Value,
        /// Exception details, when the expression threw.
        exception_details: Option<Value>,
    },

    /// A pause won the race; the call result was discarded.
    Paused {
        /// Pause reason.
        reason: String,
        /// Call stack at the pause point.
        call_frames: Vec<CallFrame>,
    },
}

impl EvaluateOutcome {
    /// Returns `true` if a pause won the race.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Renders the tool-level result shape.
    #[must_use]
    pub fn to_tool_json(&self) -> Value {
        match self {
            Self::Paused {
                reason,
                call_frames,
            } => json!({
                "paused": true,
                "pauseReason": reason,
                "callFrameCount": call_frames.len(),
                "topFrame": call_frames.first(),
            }),

            Self::Value {
                result,
                exception_details: Some(details),
            } => json!({
                "exception": exception_summary(details, result),
                "details": details,
            }),

            Self::Value { result, .. } => {
                let mut shape = json!({
                    "type": result.get("type").cloned().unwrap_or(Value::Null),
                    "paused": false,
                });
                for key in ["subtype", "value", "description", "objectId"] {
                    if let Some(field) = result.get(key) {
                        shape[key] = field.clone();
                    }
                }
                shape
            }
        }
    }
}

// ============================================================================
// BreakpointAware
// ============================================================================

/// Result of an operation wrapped in a pause detection window.
#[derive(Debug, Clone)]
pub struct BreakpointAware<T> {
    /// The operation's own result.
    pub result: T,
    /// Whether a pause was observed within the window.
    pub paused: bool,
    /// Pause reason, when paused.
    pub pause_reason: Option<String>,
    /// Call stack at the pause point, when paused.
    pub call_frames: Vec<CallFrame>,
}

impl<T> BreakpointAware<T> {
    fn completed(result: T) -> Self {
        Self {
            result,
            paused: false,
            pause_reason: None,
            call_frames: Vec::new(),
        }
    }

    fn paused(result: T, notice: PauseNotice) -> Self {
        Self {
            result,
            paused: true,
            pause_reason: Some(notice.reason),
            call_frames: notice.call_frames,
        }
    }
}

// ============================================================================
// Session - Evaluation
// ============================================================================

impl Session {
    /// Evaluates an expression in the page, racing the call against a pause.
    ///
    /// While already paused this fails immediately with
    /// [`Error::AlreadyPaused`] and makes no protocol call; evaluation in a
    /// paused isolate must target a call frame via
    /// [`Session::evaluate_on_frame`].
    ///
    /// With the debugger disabled the call cannot pause and its result is
    /// returned directly.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyPaused`] if execution is paused before the call
    /// - [`Error::NotConnected`] without a transport
    /// - Transport errors from the underlying call
    pub async fn evaluate(
        &self,
        expression: &str,
        options: EvaluateOptions,
    ) -> Result<EvaluateOutcome> {
        if let Some(reason) = self.debug.pause_reason() {
            return Err(Error::already_paused(reason));
        }

        let params = json!({
            "expression": expression,
            "returnByValue": options.return_by_value,
            "awaitPromise": options.await_promise,
        });

        if !self.debug.is_enabled() {
            let result = self.send("Runtime.evaluate", Some(params)).await?;
            return Ok(value_outcome(result));
        }

        // Subscribe before issuing the call: a pause arriving between the
        // send and our first poll must not be lost.
        let mut pauses = self.subscribe_pauses();
        let transport = self.transport()?;
        let send = transport.send_with_timeout("Runtime.evaluate", Some(params), self.config.timeout);
        tokio::pin!(send);

        tokio::select! {
            result = &mut send => Ok(value_outcome(result?)),

            notice = next_pause(&mut pauses) => match notice {
                Some(notice) => {
                    debug!(reason = %notice.reason, "Pause won the evaluate race");
                    // The call stays outstanding; the transport drains its
                    // late response and frees the slot.
                    Ok(EvaluateOutcome::Paused {
                        reason: notice.reason,
                        call_frames: notice.call_frames,
                    })
                }
                // Channel gone means the session is tearing down; settle on
                // whatever the call produces.
                None => Ok(value_outcome(send.await?)),
            },
        }
    }

    /// Evaluates an expression on a specific call frame while paused.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPaused`] while execution is running
    pub async fn evaluate_on_frame(
        &self,
        call_frame_id: &str,
        expression: &str,
        options: EvaluateOptions,
    ) -> Result<EvaluateOutcome> {
        if !self.debug.is_paused() {
            return Err(Error::NotPaused);
        }

        let result = self
            .send(
                "Debugger.evaluateOnCallFrame",
                Some(json!({
                    "callFrameId": call_frame_id,
                    "expression": expression,
                    "returnByValue": options.return_by_value,
                })),
            )
            .await?;

        Ok(value_outcome(result))
    }

    /// Runs a command and watches for a pause it may have triggered.
    ///
    /// The command response is awaited first; a pause observed within the
    /// configured detection window marks the result `paused`. A pause
    /// arriving later is still visible through the debug state.
    pub async fn send_with_breakpoint_detection(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<BreakpointAware<Value>> {
        let mut pauses = self.subscribe_pauses();
        let result = self.send(method, params).await?;

        if !self.debug.is_enabled() {
            return Ok(BreakpointAware::completed(result));
        }

        match timeout(self.config.pause_detection_window, next_pause(&mut pauses)).await {
            Ok(Some(notice)) => Ok(BreakpointAware::paused(result, notice)),
            _ => Ok(BreakpointAware::completed(result)),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Receives the next pause notice, riding out lag. `None` means the channel
/// closed.
async fn next_pause(rx: &mut broadcast::Receiver<PauseNotice>) -> Option<PauseNotice> {
    loop {
        match rx.recv().await {
            Ok(notice) => return Some(notice),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Builds the completed-call outcome from a `Runtime.evaluate`-shaped result.
fn value_outcome(result: Value) -> EvaluateOutcome {
    EvaluateOutcome::Value {
        exception_details: result.get("exceptionDetails").cloned(),
        result: result.get("result").cloned().unwrap_or(Value::Null),
    }
}

/// Short exception text for the tool-level shape.
fn exception_summary(details: &Value, result: &Value) -> String {
    details
        .get("exception")
        .and_then(|e| e.get("description"))
        .and_then(Value::as_str)
        .or_else(|| result.get("description").and_then(Value::as_str))
        .or_else(|| details.get("text").and_then(Value::as_str))
        .unwrap_or("Evaluation failed")
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::session::SessionConfig;

    #[tokio::test]
    async fn test_evaluate_fails_fast_when_already_paused() {
        let session = Session::new(SessionConfig::default());
        session.debug.set_enabled(true);
        session
            .debug
            .on_paused("breakpoint".into(), Vec::new(), Vec::new(), None, None);

        // No transport is connected: reaching the wire would return
        // NotConnected instead, so AlreadyPaused proves the pre-check fired
        // before any protocol call.
        let err = session
            .evaluate("1+2", EvaluateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyPaused { .. }));
    }

    #[tokio::test]
    async fn test_evaluate_on_frame_requires_pause() {
        let session = Session::new(SessionConfig::default());
        let err = session
            .evaluate_on_frame("frame-0", "x", EvaluateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotPaused));
    }

    #[test]
    fn test_value_outcome_extracts_fields() {
        let outcome = value_outcome(serde_json::json!({
            "result": { "type": "number", "value": 3 }
        }));

        match &outcome {
            EvaluateOutcome::Value {
                result,
                exception_details,
            } => {
                assert_eq!(result["value"], 3);
                assert!(exception_details.is_none());
            }
            EvaluateOutcome::Paused { .. } => panic!("expected value"),
        }

        let json = outcome.to_tool_json();
        assert_eq!(json["type"], "number");
        assert_eq!(json["value"], 3);
        assert_eq!(json["paused"], false);
    }

    #[test]
    fn test_exception_tool_shape() {
        let outcome = value_outcome(serde_json::json!({
            "result": { "type": "object", "subtype": "error", "description": "Error: boom" },
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": { "description": "Error: boom\n    at <anonymous>:1:7" }
            }
        }));

        let json = outcome.to_tool_json();
        assert!(json["exception"].as_str().unwrap().starts_with("Error: boom"));
        assert!(json["details"]["text"].is_string());
    }

    #[test]
    fn test_paused_tool_shape() {
        let outcome = EvaluateOutcome::Paused {
            reason: "breakpoint".to_string(),
            call_frames: Vec::new(),
        };

        let json = outcome.to_tool_json();
        assert_eq!(json["paused"], true);
        assert_eq!(json["pauseReason"], "breakpoint");
        assert_eq!(json["callFrameCount"], 0);
    }
}
