//! Event routing into the state projections.
//!
//! A spawned task drains the transport's event stream, parses each frame
//! into a typed [`CdpEvent`], and applies it to exactly one projection.
//! Routing is pure in-memory bookkeeping and never blocks.
//!
//! Pause events additionally notify facade subscribers, strictly after the
//! debug state is updated so a subscriber that queries state on wake sees
//! the pause.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::protocol::{CallFrame, CdpEvent};
use crate::state::{ConsoleState, DebugState, FetchInterceptor, NetworkState, ScriptRegistry, ScriptInfo};
use crate::transport::EventReceiver;

use super::core::{DocumentCache, WorkerRegistry};
use super::logs::{LogBuffer, LogEntry};

// ============================================================================
// PauseNotice
// ============================================================================

/// Broadcast payload for a `Debugger.paused` event.
///
/// Subscribers racing an evaluate against a pause receive this; the debug
/// state is already updated when it arrives.
#[derive(Debug, Clone)]
pub struct PauseNotice {
    /// Pause reason.
    pub reason: String,
    /// Call stack at the pause point.
    pub call_frames: Vec<CallFrame>,
}

// ============================================================================
// Projections
// ============================================================================

/// Shared handles to every projection the router feeds.
pub(crate) struct Projections {
    pub(crate) debug: Arc<DebugState>,
    pub(crate) scripts: Arc<ScriptRegistry>,
    pub(crate) network: Arc<NetworkState>,
    pub(crate) console: Arc<ConsoleState>,
    pub(crate) fetch: Arc<FetchInterceptor>,
    pub(crate) logs: Arc<LogBuffer>,
    pub(crate) workers: Arc<WorkerRegistry>,
    pub(crate) document: Arc<DocumentCache>,
    pub(crate) pause_tx: broadcast::Sender<PauseNotice>,
}

impl Projections {
    /// Applies one event to its projection.
    pub(crate) fn route(&self, event: CdpEvent) {
        match event {
            CdpEvent::ScriptParsed {
                script_id,
                url,
                start_line,
                start_column,
                end_line,
                end_column,
                execution_context_id,
                source_map_url,
                hash,
            } => {
                self.scripts.on_script_parsed(ScriptInfo {
                    script_id,
                    url,
                    start_line,
                    start_column,
                    end_line,
                    end_column,
                    execution_context_id,
                    source_map_url,
                    hash,
                });
            }

            CdpEvent::DebuggerPaused {
                reason,
                call_frames,
                hit_breakpoints,
                data,
                async_stack_trace,
            } => {
                // State first, notification second: a woken subscriber must
                // observe the pause.
                self.debug.on_paused(
                    reason.clone(),
                    call_frames.clone(),
                    hit_breakpoints,
                    data,
                    async_stack_trace,
                );
                let _ = self.pause_tx.send(PauseNotice {
                    reason,
                    call_frames,
                });
            }

            CdpEvent::DebuggerResumed => self.debug.on_resumed(),

            CdpEvent::BreakpointResolved {
                breakpoint_id,
                location,
            } => self.debug.on_breakpoint_resolved(&breakpoint_id, location),

            CdpEvent::ConsoleApiCalled {
                kind,
                args,
                timestamp,
                stack_trace,
            } => self
                .console
                .on_console_api_called(kind, args, timestamp, stack_trace),

            CdpEvent::ExceptionThrown { timestamp, details } => {
                self.console.on_exception_thrown(timestamp, details);
            }

            CdpEvent::RequestWillBeSent {
                request_id,
                url,
                method,
                resource_type,
                timestamp,
            } => self
                .network
                .on_request_will_be_sent(request_id, url, method, resource_type, timestamp),

            CdpEvent::ResponseReceived {
                request_id,
                status,
                status_text,
                mime_type,
                response,
            } => self
                .network
                .on_response_received(&request_id, status, status_text, mime_type, response),

            CdpEvent::LoadingFinished {
                request_id,
                timestamp,
                encoded_data_length,
            } => self
                .network
                .on_loading_finished(&request_id, timestamp, encoded_data_length),

            CdpEvent::LoadingFailed {
                request_id,
                timestamp,
                error_text,
                canceled,
            } => self
                .network
                .on_loading_failed(&request_id, timestamp, error_text, canceled),

            CdpEvent::FetchRequestPaused {
                request_id,
                url,
                method,
                resource_type,
                headers,
                post_data,
                network_id: _,
            } => self.fetch.on_request_paused(
                request_id,
                url,
                method,
                resource_type,
                headers,
                post_data,
            ),

            CdpEvent::LogEntryAdded {
                source,
                level,
                text,
                timestamp,
                url,
            } => self.logs.push(LogEntry {
                source,
                level,
                text,
                timestamp,
                url,
            }),

            CdpEvent::WorkerRegistrationUpdated { registrations } => {
                self.workers.upsert_registrations(registrations);
            }

            CdpEvent::WorkerVersionUpdated { versions } => {
                self.workers.upsert_versions(versions);
            }

            CdpEvent::DocumentUpdated => self.document.invalidate(),

            CdpEvent::Unknown { method, .. } => {
                trace!(%method, "Unrouted event");
            }
        }
    }
}

// ============================================================================
// Router Task
// ============================================================================

/// Spawns the routing task over a transport event subscription.
///
/// The task ends when the transport closes. A lagged receiver (burst beyond
/// the channel capacity) drops the missed events and keeps going; bounded
/// projections tolerate gaps.
pub(crate) fn spawn(projections: Arc<Projections>, mut events: EventReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(message) => projections.route(CdpEvent::parse(&message)),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Event router lagged; dropped events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        trace!("Event router terminated");
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::protocol::EventMessage;

    fn projections() -> (Arc<Projections>, broadcast::Receiver<PauseNotice>) {
        let (pause_tx, pause_rx) = broadcast::channel(16);
        let projections = Arc::new(Projections {
            debug: Arc::new(DebugState::new()),
            scripts: Arc::new(ScriptRegistry::new()),
            network: Arc::new(NetworkState::default()),
            console: Arc::new(ConsoleState::default()),
            fetch: Arc::new(FetchInterceptor::new()),
            logs: Arc::new(LogBuffer::new(1000)),
            workers: Arc::new(WorkerRegistry::default()),
            document: Arc::new(DocumentCache::default()),
            pause_tx,
        });
        (projections, pause_rx)
    }

    fn route(projections: &Projections, method: &str, params: serde_json::Value) {
        let message = EventMessage {
            method: method.to_string(),
            params,
            session_id: None,
        };
        projections.route(CdpEvent::parse(&message));
    }

    #[test]
    fn test_paused_updates_state_before_notifying() {
        let (projections, mut pause_rx) = projections();

        route(
            &projections,
            "Debugger.paused",
            json!({
                "reason": "breakpoint",
                "callFrames": [{
                    "callFrameId": "f0",
                    "functionName": "fn",
                    "location": { "scriptId": "1", "lineNumber": 4, "columnNumber": 0 },
                    "url": "http://x/p.html"
                }]
            }),
        );

        // The notice is already buffered and the state already paused.
        assert!(projections.debug.is_paused());
        let notice = pause_rx.try_recv().expect("notice buffered");
        assert_eq!(notice.reason, "breakpoint");
        assert_eq!(notice.call_frames.len(), 1);
    }

    #[test]
    fn test_resumed_resets_state() {
        let (projections, _pause_rx) = projections();

        route(
            &projections,
            "Debugger.paused",
            json!({ "reason": "other", "callFrames": [{ "callFrameId": "f0" }] }),
        );
        route(&projections, "Debugger.resumed", json!({}));

        assert!(!projections.debug.is_paused());
    }

    #[test]
    fn test_script_parsed_routing() {
        let (projections, _pause_rx) = projections();

        route(
            &projections,
            "Debugger.scriptParsed",
            json!({ "scriptId": "7", "url": "http://x/app.js", "endLine": 120 }),
        );

        assert_eq!(projections.scripts.count(), 1);
        let info = projections
            .scripts
            .get(&crate::identifiers::ScriptId::new("7"))
            .expect("present");
        assert_eq!(info.end_line, 120);
    }

    #[test]
    fn test_network_lifecycle_routing() {
        let (projections, _pause_rx) = projections();

        route(
            &projections,
            "Network.requestWillBeSent",
            json!({
                "requestId": "req1",
                "type": "XHR",
                "timestamp": 1.0,
                "request": { "url": "http://x/api", "method": "GET" }
            }),
        );
        route(
            &projections,
            "Network.loadingFinished",
            json!({ "requestId": "req1", "timestamp": 2.0, "encodedDataLength": 10 }),
        );

        let all = projections.network.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].duration(), Some(1.0));
    }

    #[test]
    fn test_fetch_paused_routing_tags_matching_rule() {
        let (projections, _pause_rx) = projections();
        let rule = projections.fetch.add_rule(crate::state::RuleSpec {
            pattern: "*/api/*".to_string(),
            resource_types: Vec::new(),
            action: crate::state::RuleAction::Mock,
            modify_headers: None,
            modify_url: None,
            mock_response: None,
            fail_reason: None,
            enabled: true,
        });

        route(
            &projections,
            "Fetch.requestPaused",
            json!({
                "requestId": "interception-1",
                "resourceType": "Fetch",
                "request": { "url": "http://x/api/users", "method": "GET", "headers": {} }
            }),
        );

        let paused = projections.fetch.paused_requests();
        assert_eq!(paused.len(), 1);
        assert_eq!(paused[0].matched_rule.as_deref(), Some(rule.id.as_str()));
    }

    #[test]
    fn test_log_entry_routing() {
        let (projections, _pause_rx) = projections();

        route(
            &projections,
            "Log.entryAdded",
            json!({ "entry": { "source": "network", "level": "error", "text": "404", "timestamp": 1.0 } }),
        );

        assert_eq!(projections.logs.len(), 1);
    }

    #[test]
    fn test_document_updated_invalidates_cache() {
        let (projections, _pause_rx) = projections();
        projections.document.set(42);

        route(&projections, "DOM.documentUpdated", json!({}));

        assert!(projections.document.get().is_none());
    }

    #[test]
    fn test_worker_registration_upsert_and_delete() {
        let (projections, _pause_rx) = projections();

        route(
            &projections,
            "ServiceWorker.workerRegistrationUpdated",
            json!({ "registrations": [{ "registrationId": "r1", "scopeURL": "http://x/", "isDeleted": false }] }),
        );
        assert_eq!(projections.workers.registration_count(), 1);

        route(
            &projections,
            "ServiceWorker.workerRegistrationUpdated",
            json!({ "registrations": [{ "registrationId": "r1", "scopeURL": "http://x/", "isDeleted": true }] }),
        );
        assert_eq!(projections.workers.registration_count(), 0);
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let (projections, _pause_rx) = projections();
        route(&projections, "Cast.sinksUpdated", json!({}));
        // Nothing to assert beyond "did not panic"; no projection changed.
        assert_eq!(projections.network.count(), 0);
    }
}
