//! Scripted DevTools endpoint for integration tests.
//!
//! Binds a local WebSocket server that speaks just enough of the protocol to
//! drive the engine: a handler closure decides what frames to send back for
//! each command, and tests can inject unsolicited event frames at any time.

// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Decides the reply frames for one inbound command frame.
pub type Handler = Box<dyn FnMut(&Value) -> Vec<Value> + Send>;

/// A running scripted endpoint.
pub struct MockChrome {
    /// WebSocket URL clients connect to.
    pub ws_url: String,
    /// Channel for injecting frames (events, late responses).
    inject: mpsc::UnboundedSender<Value>,
    /// Every command frame received, in arrival order.
    received: Arc<Mutex<Vec<Value>>>,
}

impl MockChrome {
    /// Starts an endpoint that acknowledges every command with an empty
    /// result.
    pub async fn ack_everything() -> Self {
        Self::start(Box::new(|frame| vec![ok_response(frame, json!({}))])).await
    }

    /// Starts an endpoint with a scripted handler.
    pub async fn start(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (inject_tx, mut inject_rx) = mpsc::unbounded_channel::<Value>();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };
            let (mut write, mut read) = ws.split();
            let mut handler = handler;

            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            let value: Value =
                                serde_json::from_str(&text).expect("client sent valid JSON");
                            received_clone.lock().push(value.clone());
                            for reply in handler(&value) {
                                if write
                                    .send(Message::Text(reply.to_string().into()))
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return,
                        Some(Err(_)) => return,
                        _ => {}
                    },
                    frame = inject_rx.recv() => match frame {
                        Some(value) => {
                            if write
                                .send(Message::Text(value.to_string().into()))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        // All senders dropped: close the socket.
                        None => {
                            let _ = write.close().await;
                            return;
                        }
                    },
                }
            }
        });

        Self {
            ws_url: format!("ws://{addr}"),
            inject: inject_tx,
            received,
        }
    }

    /// Injects a frame toward the client.
    pub fn inject(&self, frame: Value) {
        self.inject.send(frame).expect("endpoint alive");
    }

    /// Injects an event frame.
    pub fn inject_event(&self, method: &str, params: Value) {
        self.inject(json!({ "method": method, "params": params }));
    }

    /// Returns every command frame received so far.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().clone()
    }

    /// Returns the received command frames for one method.
    pub fn received_for(&self, method: &str) -> Vec<Value> {
        self.received
            .lock()
            .iter()
            .filter(|f| f["method"] == method)
            .cloned()
            .collect()
    }

    /// Closes the connection from the server side.
    pub fn close(self) {
        drop(self.inject);
    }
}

/// Builds a success response for a command frame.
pub fn ok_response(frame: &Value, result: Value) -> Value {
    json!({ "id": frame["id"], "result": result })
}

/// Builds an error response for a command frame.
pub fn error_response(frame: &Value, code: i64, message: &str) -> Value {
    json!({ "id": frame["id"], "error": { "code": code, "message": message } })
}

/// Polls a condition until it holds or the deadline passes.
pub async fn wait_until<F: Fn() -> bool>(condition: F, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
