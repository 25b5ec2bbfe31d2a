//! Session struct, lifecycle, and connection handling.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::launcher::{ChromeProcess, LaunchOptions};
use crate::state::{ConsoleState, DebugState, FetchInterceptor, NetworkState, ScriptRegistry};
use crate::transport::Transport;

use super::config::SessionConfig;
use super::logs::{LogBuffer, LogEntry};
use super::router::{self, PauseNotice, Projections};

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the pause notification channel.
const PAUSE_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// DocumentCache
// ============================================================================

/// Cached root document node id, invalidated by `DOM.documentUpdated`.
#[derive(Debug, Default)]
pub(crate) struct DocumentCache {
    node_id: Mutex<Option<i64>>,
}

impl DocumentCache {
    /// Returns the cached node id, if still valid.
    pub(crate) fn get(&self) -> Option<i64> {
        *self.node_id.lock()
    }

    /// Caches a fetched node id.
    pub(crate) fn set(&self, node_id: i64) {
        *self.node_id.lock() = Some(node_id);
    }

    /// Drops the cached id.
    pub(crate) fn invalidate(&self) {
        *self.node_id.lock() = None;
    }
}

// ============================================================================
// WorkerRegistry
// ============================================================================

/// Service worker registration and version maps, upserted by id.
#[derive(Debug, Default)]
pub(crate) struct WorkerRegistry {
    inner: Mutex<WorkerMaps>,
}

#[derive(Debug, Default)]
struct WorkerMaps {
    registrations: FxHashMap<String, Value>,
    versions: FxHashMap<String, Value>,
}

impl WorkerRegistry {
    /// Upserts registrations by `registrationId`, honoring `isDeleted`.
    pub(crate) fn upsert_registrations(&self, registrations: Vec<Value>) {
        let mut inner = self.inner.lock();
        for registration in registrations {
            let Some(id) = registration
                .get("registrationId")
                .and_then(Value::as_str)
                .map(ToString::to_string)
            else {
                continue;
            };

            if registration
                .get("isDeleted")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                inner.registrations.remove(&id);
            } else {
                inner.registrations.insert(id, registration);
            }
        }
    }

    /// Upserts versions by `versionId`.
    pub(crate) fn upsert_versions(&self, versions: Vec<Value>) {
        let mut inner = self.inner.lock();
        for version in versions {
            let Some(id) = version
                .get("versionId")
                .and_then(Value::as_str)
                .map(ToString::to_string)
            else {
                continue;
            };
            inner.versions.insert(id, version);
        }
    }

    /// Returns the number of live registrations.
    pub(crate) fn registration_count(&self) -> usize {
        self.inner.lock().registrations.len()
    }

    /// Returns both maps as JSON arrays.
    pub(crate) fn snapshot(&self) -> Value {
        let inner = self.inner.lock();
        serde_json::json!({
            "registrations": inner.registrations.values().cloned().collect::<Vec<_>>(),
            "versions": inner.versions.values().cloned().collect::<Vec<_>>(),
        })
    }

    /// Clears both maps.
    pub(crate) fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.registrations.clear();
        inner.versions.clear();
    }
}

// ============================================================================
// Session
// ============================================================================

/// A debugging session over one browser target.
///
/// The session exclusively owns the transport and all state projections.
/// Callers read projection state through query methods returning snapshots.
///
/// # Example
///
/// ```ignore
/// let session = Session::new(SessionConfig::default());
/// session.launch(LaunchOptions::default()).await?;
/// session.enable_debugger().await?;
/// ```
pub struct Session {
    /// Configuration knobs.
    pub(crate) config: SessionConfig,
    /// Active transport, absent while disconnected.
    transport: Mutex<Option<Transport>>,
    /// HTTP endpoint base, preserved across target switches.
    http_base: Mutex<Option<String>>,
    /// Owned Chrome process, when launched by this session.
    chrome: Mutex<Option<ChromeProcess>>,
    /// Debugger projection.
    pub(crate) debug: Arc<DebugState>,
    /// Script registry projection.
    pub(crate) scripts: Arc<ScriptRegistry>,
    /// Network projection.
    pub(crate) network: Arc<NetworkState>,
    /// Console projection.
    pub(crate) console: Arc<ConsoleState>,
    /// Fetch interception projection.
    pub(crate) fetch: Arc<FetchInterceptor>,
    /// Browser log buffer.
    pub(crate) logs: Arc<LogBuffer>,
    /// Service worker maps.
    pub(crate) workers: Arc<WorkerRegistry>,
    /// Cached document node id.
    pub(crate) document: Arc<DocumentCache>,
    /// Pause notification channel.
    pause_tx: broadcast::Sender<PauseNotice>,
    /// Running router task, one per connection.
    router: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("connected", &self.is_connected())
            .field("paused", &self.debug.is_paused())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Construction
// ============================================================================

impl Session {
    /// Creates a session with the given configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let (pause_tx, _) = broadcast::channel(PAUSE_CHANNEL_CAPACITY);

        Self {
            debug: Arc::new(DebugState::new()),
            scripts: Arc::new(ScriptRegistry::new()),
            network: Arc::new(NetworkState::new(config.max_requests)),
            console: Arc::new(ConsoleState::new(config.max_console_messages)),
            fetch: Arc::new(FetchInterceptor::new()),
            logs: Arc::new(LogBuffer::new(config.max_log_entries)),
            workers: Arc::new(WorkerRegistry::default()),
            document: Arc::new(DocumentCache::default()),
            transport: Mutex::new(None),
            http_base: Mutex::new(None),
            chrome: Mutex::new(None),
            pause_tx,
            router: Mutex::new(None),
            config,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Launches a Chrome process and connects to its browser endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::ChromeNotFound`] if no executable was found or configured
    /// - [`Error::ProcessLaunchFailed`] if the process fails to start
    /// - Connection errors from the WebSocket handshake
    pub async fn launch(&self, options: LaunchOptions) -> Result<()> {
        let chrome = crate::launcher::launch(options).await?;
        let ws_endpoint = chrome.ws_endpoint().to_string();
        let http_base = chrome.http_base();

        *self.chrome.lock() = Some(chrome);
        *self.http_base.lock() = Some(http_base);

        self.connect(&ws_endpoint).await
    }

    /// Connects to a DevTools WebSocket endpoint.
    ///
    /// An existing connection is torn down first; projection state survives
    /// the reconnect.
    pub async fn connect(&self, ws_url: &str) -> Result<()> {
        self.disconnect();

        let transport = Transport::connect(ws_url).await?;
        let events = transport.subscribe_events();

        let projections = Arc::new(Projections {
            debug: Arc::clone(&self.debug),
            scripts: Arc::clone(&self.scripts),
            network: Arc::clone(&self.network),
            console: Arc::clone(&self.console),
            fetch: Arc::clone(&self.fetch),
            logs: Arc::clone(&self.logs),
            workers: Arc::clone(&self.workers),
            document: Arc::clone(&self.document),
            pause_tx: self.pause_tx.clone(),
        });

        *self.router.lock() = Some(router::spawn(projections, events));
        *self.transport.lock() = Some(transport);

        info!(url = %ws_url, "Session connected");
        Ok(())
    }

    /// Records the HTTP endpoint base (e.g. `http://127.0.0.1:9222`).
    ///
    /// Target listings keep working across target switches because the base
    /// outlives any one WebSocket connection.
    pub fn set_http_base(&self, http_base: impl Into<String>) {
        *self.http_base.lock() = Some(http_base.into());
    }

    /// Returns the HTTP endpoint base, if known.
    #[must_use]
    pub fn http_base(&self) -> Option<String> {
        self.http_base.lock().clone()
    }

    /// Closes the connection.
    ///
    /// Every in-flight call fails with [`Error::ConnectionClosed`]; the
    /// projections keep their state for post-mortem queries.
    pub fn disconnect(&self) {
        if let Some(transport) = self.transport.lock().take() {
            debug!("Disconnecting session");
            transport.disconnect();
        }
        if let Some(router) = self.router.lock().take() {
            // The router drains on its own once the transport closes; abort
            // covers a reconnect racing the old task.
            router.abort();
        }
    }

    /// Kills the owned Chrome process and clears all projection state.
    ///
    /// A no-op for the process part when the session attached to an external
    /// browser.
    pub async fn kill(&self) -> Result<()> {
        self.disconnect();

        let chrome = self.chrome.lock().take();
        if let Some(chrome) = chrome {
            chrome.kill().await?;
        }

        self.reset();
        Ok(())
    }

    /// Clears every projection, the log buffer, worker maps, and the
    /// document cache.
    pub fn reset(&self) {
        self.debug.reset();
        self.scripts.reset();
        self.network.reset();
        self.console.reset();
        self.fetch.reset();
        self.logs.clear();
        self.workers.clear();
        self.document.invalidate();
    }

    /// Returns `true` while a transport is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport
            .lock()
            .as_ref()
            .is_some_and(Transport::is_connected)
    }
}

// ============================================================================
// Session - Internal API
// ============================================================================

impl Session {
    /// Returns a handle to the active transport.
    pub(crate) fn transport(&self) -> Result<Transport> {
        self.transport
            .lock()
            .as_ref()
            .filter(|t| t.is_connected())
            .cloned()
            .ok_or(Error::NotConnected)
    }

    /// Sends a command with the session timeout.
    pub(crate) async fn send(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let transport = self.transport()?;
        transport
            .send_with_timeout(method, params, self.config.timeout)
            .await
    }

    /// Subscribes to pause notifications.
    pub(crate) fn subscribe_pauses(&self) -> broadcast::Receiver<PauseNotice> {
        self.pause_tx.subscribe()
    }
}

// ============================================================================
// Session - Auxiliary Domains
// ============================================================================

impl Session {
    /// Enables the browser log domain; entries land in the log buffer.
    pub async fn enable_log(&self) -> Result<()> {
        self.send("Log.enable", None).await.map(|_| ())
    }

    /// Disables the browser log domain.
    pub async fn disable_log(&self) -> Result<()> {
        self.send("Log.disable", None).await.map(|_| ())
    }

    /// Enables service worker tracking; updates land in the worker maps.
    pub async fn enable_service_workers(&self) -> Result<()> {
        self.send("ServiceWorker.enable", None).await.map(|_| ())
    }

    /// Disables service worker tracking.
    pub async fn disable_service_workers(&self) -> Result<()> {
        self.send("ServiceWorker.disable", None).await.map(|_| ())
    }
}

// ============================================================================
// Session - Log and Worker Queries
// ============================================================================

impl Session {
    /// Returns the buffered browser log entries, oldest first.
    #[must_use]
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.logs.entries()
    }

    /// Clears the browser log buffer.
    pub fn clear_logs(&self) {
        self.logs.clear();
    }

    /// Returns the service worker registration and version maps.
    #[must_use]
    pub fn service_workers(&self) -> Value {
        self.workers.snapshot()
    }

    /// Summarizes the debugger projection for tool output.
    #[must_use]
    pub fn debug_state(&self) -> Value {
        self.debug.to_json()
    }
}

// ============================================================================
// Tests
// ============================================================================
