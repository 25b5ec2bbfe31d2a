//! Typed event payloads.
//!
//! CDP is a loosely typed JSON protocol. Each event family is modeled as a
//! tagged variant carrying only the fields the state projections consume;
//! everything else rides along opaquely in `serde_json::Value` fields so new
//! Chrome additions never break decoding.
//!
//! # Event Routing
//!
//! | Method | Variant | Consumed by |
//! |--------|---------|-------------|
//! | `Debugger.scriptParsed` | [`CdpEvent::ScriptParsed`] | script registry |
//! | `Debugger.paused` / `resumed` | [`CdpEvent::DebuggerPaused`] / [`CdpEvent::DebuggerResumed`] | debug state |
//! | `Debugger.breakpointResolved` | [`CdpEvent::BreakpointResolved`] | debug state |
//! | `Runtime.consoleAPICalled` / `exceptionThrown` | [`CdpEvent::ConsoleApiCalled`] / [`CdpEvent::ExceptionThrown`] | console state |
//! | `Network.*` | four network variants | network state |
//! | `Fetch.requestPaused` | [`CdpEvent::FetchRequestPaused`] | fetch interceptor |
//! | `Log.entryAdded` | [`CdpEvent::LogEntryAdded`] | log buffer |
//! | `ServiceWorker.*Updated` | two worker variants | worker maps |
//! | `DOM.documentUpdated` | [`CdpEvent::DocumentUpdated`] | document cache |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::identifiers::{BreakpointId, CallFrameId, RequestId, ScriptId};

use super::message::EventMessage;

// ============================================================================
// ScriptLocation
// ============================================================================

/// A concrete source location inside a parsed script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptLocation {
    /// Script containing the location.
    pub script_id: ScriptId,
    /// Zero-based line number.
    pub line_number: u32,
    /// Zero-based column number.
    pub column_number: u32,
}

impl ScriptLocation {
    pub(crate) fn from_value(value: &Value) -> Self {
        Self {
            script_id: ScriptId::new(get_string(value, "scriptId")),
            line_number: get_u64(value, "lineNumber") as u32,
            column_number: get_u64(value, "columnNumber") as u32,
        }
    }
}

// ============================================================================
// CallFrame
// ============================================================================

/// One frame of a paused call stack.
///
/// `raw` keeps the complete frame payload (scope chain, `this`, etc.) so
/// snapshots hand callers everything Chrome sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// Frame identifier for `Debugger.evaluateOnCallFrame`.
    pub call_frame_id: CallFrameId,
    /// Name of the executing function, empty for anonymous frames.
    pub function_name: String,
    /// Source location of the frame.
    pub location: ScriptLocation,
    /// Script URL, empty for inline/eval frames.
    pub url: String,
    /// Complete frame payload as received.
    #[serde(skip)]
    pub raw: Value,
}

impl CallFrame {
    fn from_value(value: &Value) -> Self {
        Self {
            call_frame_id: CallFrameId::new(get_string(value, "callFrameId")),
            function_name: get_string(value, "functionName"),
            location: ScriptLocation::from_value(value.get("location").unwrap_or(&Value::Null)),
            url: get_string(value, "url"),
            raw: value.clone(),
        }
    }
}

// ============================================================================
// CdpEvent
// ============================================================================

/// Parsed event types for type-safe routing.
#[derive(Debug, Clone)]
pub enum CdpEvent {
    /// A script was compiled in the target.
    ScriptParsed {
        /// Script identifier.
        script_id: ScriptId,
        /// Script URL, empty for inline scripts.
        url: String,
        /// First line of the script in its resource.
        start_line: u32,
        /// First column of the script in its resource.
        start_column: u32,
        /// Last line of the script.
        end_line: u32,
        /// Last column of the script.
        end_column: u32,
        /// Execution context the script belongs to.
        execution_context_id: i64,
        /// Source map URL, if any.
        source_map_url: Option<String>,
        /// Content hash.
        hash: String,
    },

    /// Execution paused on a breakpoint, exception, or step.
    DebuggerPaused {
        /// Pause reason (`breakpoint`, `exception`, `other`, …).
        reason: String,
        /// Call stack, innermost frame first. Non-empty on a real pause.
        call_frames: Vec<CallFrame>,
        /// Breakpoints that triggered the pause.
        hit_breakpoints: Vec<BreakpointId>,
        /// Reason-specific auxiliary data.
        data: Option<Value>,
        /// Async stack trace, when async stacks are enabled.
        async_stack_trace: Option<Value>,
    },

    /// Execution resumed.
    DebuggerResumed,

    /// A URL breakpoint bound to a concrete location after a script parsed.
    BreakpointResolved {
        /// The breakpoint that resolved.
        breakpoint_id: BreakpointId,
        /// The concrete location Chrome derived.
        location: ScriptLocation,
    },

    /// `console.*` was called in the target.
    ConsoleApiCalled {
        /// Call type (`log`, `warning`, `error`, `debug`, `table`, …).
        kind: String,
        /// Argument remote objects, opaque.
        args: Vec<Value>,
        /// Call timestamp.
        timestamp: f64,
        /// Stack trace of the call site, if captured.
        stack_trace: Option<Value>,
    },

    /// An uncaught exception was thrown.
    ExceptionThrown {
        /// Throw timestamp.
        timestamp: f64,
        /// Exception details payload, opaque.
        details: Value,
    },

    /// A network request is about to go on the wire.
    RequestWillBeSent {
        /// Request identifier.
        request_id: RequestId,
        /// Request URL.
        url: String,
        /// HTTP method.
        method: String,
        /// Resource type (`Document`, `Script`, `XHR`, …).
        resource_type: String,
        /// Monotonic send timestamp.
        timestamp: f64,
    },

    /// Response headers arrived for a request.
    ResponseReceived {
        /// Request identifier.
        request_id: RequestId,
        /// HTTP status code.
        status: u16,
        /// HTTP status text.
        status_text: String,
        /// Response MIME type.
        mime_type: String,
        /// Complete response payload, opaque.
        response: Value,
    },

    /// A request finished loading.
    LoadingFinished {
        /// Request identifier.
        request_id: RequestId,
        /// Monotonic finish timestamp.
        timestamp: f64,
        /// Total encoded bytes received.
        encoded_data_length: u64,
    },

    /// A request failed to load.
    LoadingFailed {
        /// Request identifier.
        request_id: RequestId,
        /// Monotonic failure timestamp.
        timestamp: f64,
        /// Failure description.
        error_text: String,
        /// Whether the request was canceled.
        canceled: bool,
    },

    /// A fetch was intercepted and is waiting for a dispatch decision.
    FetchRequestPaused {
        /// Interception request identifier (Fetch domain).
        request_id: RequestId,
        /// Request URL.
        url: String,
        /// HTTP method.
        method: String,
        /// Resource type.
        resource_type: String,
        /// Request headers as a JSON object.
        headers: Value,
        /// Request body, if present.
        post_data: Option<String>,
        /// Corresponding Network-domain request id, if known.
        network_id: Option<RequestId>,
    },

    /// A browser log entry was added.
    LogEntryAdded {
        /// Log source (`javascript`, `network`, `security`, …).
        source: String,
        /// Severity level.
        level: String,
        /// Entry text.
        text: String,
        /// Entry timestamp.
        timestamp: f64,
        /// Associated URL, if any.
        url: Option<String>,
    },

    /// Service worker registrations changed.
    WorkerRegistrationUpdated {
        /// Updated registration payloads, opaque.
        registrations: Vec<Value>,
    },

    /// Service worker versions changed.
    WorkerVersionUpdated {
        /// Updated version payloads, opaque.
        versions: Vec<Value>,
    },

    /// The document was replaced; cached node ids are stale.
    DocumentUpdated,

    /// Unrecognized event, carried through opaquely.
    Unknown {
        /// Event method.
        method: String,
        /// Event payload.
        params: Value,
    },
}

// ============================================================================
// Event Parsing
// ============================================================================

impl CdpEvent {
    /// Parses an inbound event frame into a typed variant.
    #[must_use]
    pub fn parse(message: &EventMessage) -> Self {
        let params = &message.params;

        match message.method.as_str() {
            "Debugger.scriptParsed" => Self::ScriptParsed {
                script_id: ScriptId::new(get_string(params, "scriptId")),
                url: get_string(params, "url"),
                start_line: get_u64(params, "startLine") as u32,
                start_column: get_u64(params, "startColumn") as u32,
                end_line: get_u64(params, "endLine") as u32,
                end_column: get_u64(params, "endColumn") as u32,
                execution_context_id: get_i64(params, "executionContextId"),
                source_map_url: get_opt_string(params, "sourceMapURL").filter(|s| !s.is_empty()),
                hash: get_string(params, "hash"),
            },

            "Debugger.paused" => Self::DebuggerPaused {
                reason: get_string_or(params, "reason", "other"),
                call_frames: params
                    .get("callFrames")
                    .and_then(Value::as_array)
                    .map(|frames| frames.iter().map(CallFrame::from_value).collect())
                    .unwrap_or_default(),
                hit_breakpoints: params
                    .get("hitBreakpoints")
                    .and_then(Value::as_array)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(Value::as_str)
                            .map(BreakpointId::new)
                            .collect()
                    })
                    .unwrap_or_default(),
                data: params.get("data").cloned(),
                async_stack_trace: params.get("asyncStackTrace").cloned(),
            },

            "Debugger.resumed" => Self::DebuggerResumed,

            "Debugger.breakpointResolved" => Self::BreakpointResolved {
                breakpoint_id: BreakpointId::new(get_string(params, "breakpointId")),
                location: ScriptLocation::from_value(
                    params.get("location").unwrap_or(&Value::Null),
                ),
            },

            "Runtime.consoleAPICalled" => Self::ConsoleApiCalled {
                kind: get_string_or(params, "type", "log"),
                args: params
                    .get("args")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                timestamp: get_f64(params, "timestamp"),
                stack_trace: params.get("stackTrace").cloned(),
            },

            "Runtime.exceptionThrown" => Self::ExceptionThrown {
                timestamp: get_f64(params, "timestamp"),
                details: params
                    .get("exceptionDetails")
                    .cloned()
                    .unwrap_or(Value::Null),
            },

            "Network.requestWillBeSent" => {
                let request = params.get("request").unwrap_or(&Value::Null);
                Self::RequestWillBeSent {
                    request_id: RequestId::new(get_string(params, "requestId")),
                    url: get_string(request, "url"),
                    method: get_string_or(request, "method", "GET"),
                    resource_type: get_string_or(params, "type", "Other"),
                    timestamp: get_f64(params, "timestamp"),
                }
            }

            "Network.responseReceived" => {
                let response = params.get("response").unwrap_or(&Value::Null);
                Self::ResponseReceived {
                    request_id: RequestId::new(get_string(params, "requestId")),
                    status: get_u64(response, "status") as u16,
                    status_text: get_string(response, "statusText"),
                    mime_type: get_string(response, "mimeType"),
                    response: response.clone(),
                }
            }

            "Network.loadingFinished" => Self::LoadingFinished {
                request_id: RequestId::new(get_string(params, "requestId")),
                timestamp: get_f64(params, "timestamp"),
                encoded_data_length: get_u64(params, "encodedDataLength"),
            },

            "Network.loadingFailed" => Self::LoadingFailed {
                request_id: RequestId::new(get_string(params, "requestId")),
                timestamp: get_f64(params, "timestamp"),
                error_text: get_string(params, "errorText"),
                canceled: get_bool(params, "canceled"),
            },

            "Fetch.requestPaused" => {
                let request = params.get("request").unwrap_or(&Value::Null);
                Self::FetchRequestPaused {
                    request_id: RequestId::new(get_string(params, "requestId")),
                    url: get_string(request, "url"),
                    method: get_string_or(request, "method", "GET"),
                    resource_type: get_string_or(params, "resourceType", "Other"),
                    headers: request.get("headers").cloned().unwrap_or(Value::Null),
                    post_data: get_opt_string(request, "postData"),
                    network_id: get_opt_string(params, "networkId").map(RequestId::new),
                }
            }

            "Log.entryAdded" => {
                let entry = params.get("entry").unwrap_or(&Value::Null);
                Self::LogEntryAdded {
                    source: get_string(entry, "source"),
                    level: get_string_or(entry, "level", "info"),
                    text: get_string(entry, "text"),
                    timestamp: get_f64(entry, "timestamp"),
                    url: get_opt_string(entry, "url"),
                }
            }

            "ServiceWorker.workerRegistrationUpdated" => Self::WorkerRegistrationUpdated {
                registrations: params
                    .get("registrations")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },

            "ServiceWorker.workerVersionUpdated" => Self::WorkerVersionUpdated {
                versions: params
                    .get("versions")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },

            "DOM.documentUpdated" => Self::DocumentUpdated,

            _ => Self::Unknown {
                method: message.method.clone(),
                params: params.clone(),
            },
        }
    }
}

// ============================================================================
// Field Extraction Helpers
// ============================================================================

/// Gets a string field, defaulting to empty.
#[inline]
fn get_string(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Gets a string field with an explicit default.
#[inline]
fn get_string_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Gets an optional string field.
#[inline]
fn get_opt_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Gets a u64 field, defaulting to 0.
#[inline]
fn get_u64(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or_default()
}

/// Gets an i64 field, defaulting to 0.
#[inline]
fn get_i64(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or_default()
}

/// Gets an f64 field, defaulting to 0.0.
#[inline]
fn get_f64(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or_default()
}

/// Gets a bool field, defaulting to false.
#[inline]
fn get_bool(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
