//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to the browser, including
//! request/response correlation and event fan-out.
//!
//! # Event Loop
//!
//! The transport spawns a tokio task that handles:
//!
//! - Incoming frames from the browser (responses, events)
//! - Outgoing commands from the session facade
//! - Request/response correlation by call id
//! - Event broadcast to subscribers
//!
//! Commands pass through a single channel consumed by the loop, so sends
//! issued in order are placed on the wire in order. Responses and events may
//! interleave arbitrarily; the correlation map sorts them out.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CallId, CallIdGenerator, SessionId};
use crate::protocol::{EventMessage, Message, MethodCall, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the WebSocket open handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// Types
// ============================================================================

/// Map of call IDs to response channels.
type CorrelationMap = FxHashMap<CallId, oneshot::Sender<Result<Response>>>;

/// Write half of the browser WebSocket.
type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Receiver half of the event broadcast.
pub type EventReceiver = broadcast::Receiver<EventMessage>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a method call and wait for the response.
    Send {
        call: MethodCall,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(CallId),
    /// Close the socket.
    Shutdown,
}

// ============================================================================
// Transport
// ============================================================================

/// WebSocket transport to a DevTools endpoint.
///
/// Handles request/response correlation and event fan-out. The transport
/// spawns an internal event loop task that exclusively owns the socket.
///
/// # Thread Safety
///
/// `Transport` is `Send + Sync` and can be shared across tasks. All
/// operations are non-blocking.
pub struct Transport {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event broadcast sender, used only to create subscriptions.
    event_tx: broadcast::Sender<EventMessage>,
    /// Call ID allocator.
    call_ids: Arc<CallIdGenerator>,
    /// Session attachment added to outgoing frames.
    session_id: Arc<Mutex<Option<SessionId>>>,
    /// Set once the event loop exits.
    closed: Arc<AtomicBool>,
}

impl Clone for Transport {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            event_tx: self.event_tx.clone(),
            call_ids: Arc::clone(&self.call_ids),
            session_id: Arc::clone(&self.session_id),
            closed: Arc::clone(&self.closed),
        }
    }
}

impl Transport {
    /// Connects to a DevTools WebSocket endpoint.
    ///
    /// Spawns the event loop task internally.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake does not complete in time
    /// - [`Error::WebSocket`] if the handshake fails
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let connect = timeout(CONNECT_TIMEOUT, connect_async(ws_url)).await;
        let (ws_stream, _) = connect
            .map_err(|_| Error::connection_timeout(CONNECT_TIMEOUT.as_millis() as u64))??;

        debug!(url = %ws_url, "WebSocket connection established");
        Ok(Self::new(ws_stream))
    }

    /// Creates a transport from an established WebSocket stream.
    pub(crate) fn new(ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            event_tx.clone(),
            Arc::clone(&closed),
        ));

        Self {
            command_tx,
            correlation,
            event_tx,
            call_ids: Arc::new(CallIdGenerator::new()),
            session_id: Arc::new(Mutex::new(None)),
            closed,
        }
    }

    /// Attaches a session; subsequent frames carry its `sessionId`.
    ///
    /// Passing `None` detaches.
    pub fn attach_session(&self, session_id: Option<SessionId>) {
        *self.session_id.lock() = session_id;
    }

    /// Returns the currently attached session, if any.
    #[must_use]
    pub fn attached_session(&self) -> Option<SessionId> {
        self.session_id.lock().clone()
    }

    /// Subscribes to inbound events.
    ///
    /// Each receiver sees every event frame from the moment of subscription.
    /// Dropping the receiver deregisters it.
    #[must_use]
    pub fn subscribe_events(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Returns the number of in-flight requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Sends a command and waits for its result with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is closed
    /// - [`Error::RequestTimeout`] if no response arrives within the timeout
    /// - [`Error::Protocol`] if the browser reports an error
    pub async fn send(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.send_with_timeout(method, params, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command and waits for its result with a custom timeout.
    ///
    /// The call id is allocated here; the caller never provides one. If the
    /// caller stops waiting (future dropped, e.g. when a pause wins an
    /// evaluate race), the correlation slot stays registered and is released
    /// when the late response finally arrives or the connection closes.
    ///
    /// # Errors
    ///
    /// See [`Transport::send`].
    pub async fn send_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        request_timeout: Duration,
    ) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::ConnectionClosed);
        }

        let call_id = self.call_ids.next();
        let call = MethodCall::new(call_id, method, params, self.session_id.lock().clone());

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send { call, response_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result?.into_result(),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                // Timeout: release the slot so the id is freed exactly once.
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(call_id));

                Err(Error::request_timeout(
                    method,
                    call_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Closes the connection.
    ///
    /// Every in-flight command fails with [`Error::ConnectionClosed`].
    pub fn disconnect(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that owns the WebSocket.
    async fn run_event_loop(
        ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_tx: broadcast::Sender<EventMessage>,
        closed: Arc<AtomicBool>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming frames from the browser
                frame = ws_read.next() => {
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => {
                            Self::handle_incoming_frame(&text, &correlation, &event_tx);
                        }

                        Some(Ok(WsMessage::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the session facade
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { call, response_tx }) => {
                            Self::handle_send_command(
                                call,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(call_id)) => {
                            correlation.lock().remove(&call_id);
                            debug!(%call_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        closed.store(true, Ordering::Release);
        Self::fail_pending_requests(&correlation);

        debug!("Transport event loop terminated");
    }

    /// Handles an incoming text frame from the browser.
    ///
    /// Malformed frames are logged and dropped; they never tear down the
    /// connection.
    fn handle_incoming_frame(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        event_tx: &broadcast::Sender<EventMessage>,
    ) {
        let message = match serde_json::from_str::<Message>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, frame = %truncate_for_log(text), "Dropping undecodable frame");
                return;
            }
        };

        match message {
            Message::Response(response) => {
                let tx = correlation.lock().remove(&response.id);

                if let Some(tx) = tx {
                    // A dropped receiver means the caller stopped waiting
                    // (pause won an evaluate race); the slot is still freed.
                    let _ = tx.send(Ok(response));
                } else {
                    warn!(id = %response.id, "Response for unknown request");
                }
            }

            Message::Event(event) => {
                trace!(method = %event.method, "Event received");
                // No subscribers is fine; the frame is simply dropped.
                let _ = event_tx.send(event);
            }
        }
    }

    /// Handles a send command from the facade.
    async fn handle_send_command(
        call: MethodCall,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut WsSink,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let call_id = call.id;

        let json = match serde_json::to_string(&call) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Register before writing so a fast response always finds its slot.
        correlation.lock().insert(call_id, response_tx);

        if let Err(e) = ws_write.send(WsMessage::Text(json.into())).await {
            warn!(%call_id, error = %e, "Failed to write frame");
            if let Some(tx) = correlation.lock().remove(&call_id) {
                let _ = tx.send(Err(Error::ConnectionClosed));
            }
            return;
        }

        trace!(%call_id, method = %call.method, "Request sent");
    }

    /// Fails all pending requests with `ConnectionClosed`.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Clips a frame for log output.
fn truncate_for_log(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_COMMAND_TIMEOUT.as_secs(), 30);
        assert_eq!(CONNECT_TIMEOUT.as_secs(), 30);
    }

    #[test]
    fn test_truncate_for_log_short() {
        assert_eq!(truncate_for_log("abc"), "abc");
    }

    #[test]
    fn test_truncate_for_log_long() {
        let long = "x".repeat(500);
        assert_eq!(truncate_for_log(&long).len(), 200);
    }
}
