//! Command, response, and event envelopes.
//!
//! Defines the JSON frame formats for the DevTools WebSocket. Payloads stay
//! loosely typed (`serde_json::Value`); only the envelopes are structured.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{CallId, SessionId};

// ============================================================================
// MethodCall
// ============================================================================

/// A command frame from the engine to the browser.
///
/// # Format
///
/// ```json
/// {
///   "id": 12,
///   "method": "Runtime.evaluate",
///   "params": { "expression": "1+2" },
///   "sessionId": "ABCD..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct MethodCall {
    /// Identifier for request/response correlation. Assigned by the
    /// transport, unique per connection.
    pub id: CallId,

    /// Method in `Domain.command` format.
    pub method: String,

    /// Command parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Target session attachment, when one is established.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl MethodCall {
    /// Creates a new method call frame.
    #[inline]
    #[must_use]
    pub fn new(
        id: CallId,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Self {
        Self {
            id,
            method: method.into(),
            params,
            session_id,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response frame from the browser.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 12, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 12, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: CallId,

    /// Result payload (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error payload (if failure).
    #[serde(default)]
    pub error: Option<ProtocolError>,
}

impl Response {
    /// Extracts the result value, mapping a protocol error to [`crate::Error`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if the browser reported an error.
    pub fn into_result(self) -> crate::Result<Value> {
        match self.error {
            Some(err) => Err(crate::Error::protocol(err.code, err.message, err.data)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// ProtocolError
// ============================================================================

/// Error payload inside a response frame.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolError {
    /// CDP error code.
    pub code: i64,

    /// Human-readable message.
    pub message: String,

    /// Optional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// EventMessage
// ============================================================================

/// An event frame from the browser (no `id`).
///
/// # Format
///
/// ```json
/// {
///   "method": "Debugger.paused",
///   "params": { ... },
///   "sessionId": "ABCD..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    /// Event name in `Domain.event` format.
    pub method: String,

    /// Event payload.
    #[serde(default)]
    pub params: Value,

    /// Session the event originated from, if attached.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<SessionId>,
}

impl EventMessage {
    /// Returns the domain prefix of the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = EventMessage { method: "Debugger.paused".into(), .. };
    /// assert_eq!(event.domain(), "Debugger");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }
}

// ============================================================================
// Message
// ============================================================================

/// Unified inbound frame: response or event.
///
/// Responses carry an `id`; events carry a `method`. The untagged
/// deserialization tries responses first so frames with both fields (which
/// Chrome does not send) resolve to the correlation path.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// A response to an outstanding method call.
    Response(Response),

    /// An event notification.
    Event(EventMessage),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_method_call_serialization() {
        let call = MethodCall::new(
            CallId::new(3),
            "Runtime.evaluate",
            Some(json!({ "expression": "1+2" })),
            None,
        );
        let json = serde_json::to_string(&call).expect("serialize");

        assert!(json.contains("\"id\":3"));
        assert!(json.contains("Runtime.evaluate"));
        assert!(json.contains("expression"));
        assert!(!json.contains("sessionId"));
    }

    #[test]
    fn test_method_call_with_session() {
        let call = MethodCall::new(
            CallId::new(1),
            "Page.enable",
            None,
            Some(crate::identifiers::SessionId::new("SESS1")),
        );
        let json = serde_json::to_string(&call).expect("serialize");

        assert!(json.contains("\"sessionId\":\"SESS1\""));
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_response_success() {
        let json_str = r#"{ "id": 5, "result": { "value": 42 } }"#;
        let msg: Message = serde_json::from_str(json_str).expect("parse");

        match msg {
            Message::Response(resp) => {
                assert_eq!(resp.id, CallId::new(5));
                let value = resp.into_result().expect("success");
                assert_eq!(value["value"], 42);
            }
            Message::Event(_) => panic!("expected response"),
        }
    }

    #[test]
    fn test_response_error() {
        let json_str = r#"{
            "id": 8,
            "error": { "code": -32601, "message": "'Bogus.method' wasn't found" }
        }"#;
        let msg: Message = serde_json::from_str(json_str).expect("parse");

        match msg {
            Message::Response(resp) => {
                let err = resp.into_result().unwrap_err();
                assert!(err.is_protocol_error());
                assert!(err.to_string().contains("-32601"));
            }
            Message::Event(_) => panic!("expected response"),
        }
    }

    #[test]
    fn test_event_frame() {
        let json_str = r#"{
            "method": "Debugger.resumed",
            "params": {},
            "sessionId": "SESS2"
        }"#;
        let msg: Message = serde_json::from_str(json_str).expect("parse");

        match msg {
            Message::Event(event) => {
                assert_eq!(event.method, "Debugger.resumed");
                assert_eq!(event.domain(), "Debugger");
                assert!(event.session_id.is_some());
            }
            Message::Response(_) => panic!("expected event"),
        }
    }

    #[test]
    fn test_event_without_params() {
        let json_str = r#"{ "method": "DOM.documentUpdated" }"#;
        let msg: Message = serde_json::from_str(json_str).expect("parse");

        match msg {
            Message::Event(event) => {
                assert_eq!(event.method, "DOM.documentUpdated");
                assert!(event.params.is_null());
            }
            Message::Response(_) => panic!("expected event"),
        }
    }
}
