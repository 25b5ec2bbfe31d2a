//! Chrome DevTools Protocol session engine for agent tooling.
//!
//! This library owns a single long-lived Chrome process (or attaches to an
//! external one) and multiplexes one WebSocket transport into a coherent
//! debugging session: request/response correlation, event demultiplexing,
//! per-domain state projection, breakpoint-aware evaluation, and fetch
//! interception.
//!
//! # Architecture
//!
//! Data flows through four layers:
//!
//! - **Transport**: correlated JSON-RPC over one WebSocket, with per-request
//!   deadlines and bulk cancellation on disconnect
//! - **Router**: decodes inbound frames and feeds each event to exactly one
//!   state projection
//! - **Projections**: bounded in-memory views (debugger, scripts, network,
//!   console, fetch interception) queried through defensive snapshots
//! - **Session facade**: maps tool-level operations onto protocol calls and
//!   carries the pause-aware evaluation contract
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_debugger::{EvaluateOptions, EvaluateOutcome, LaunchOptions, Result, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::default();
//!     session.launch(LaunchOptions::default()).await?;
//!
//!     session.enable_debugger().await?;
//!     session.enable_runtime().await?;
//!
//!     match session.evaluate("1 + 2", EvaluateOptions::default()).await? {
//!         EvaluateOutcome::Value { result, .. } => println!("{result}"),
//!         EvaluateOutcome::Paused { reason, .. } => println!("paused: {reason}"),
//!     }
//!
//!     session.kill().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Session facade: lifecycle, evaluation, domain operations |
//! | [`state`] | In-memory projections over the event stream |
//! | [`transport`] | Correlated WebSocket transport |
//! | [`protocol`] | Wire envelopes and typed event payloads |
//! | [`pattern`] | Shared URL pattern matcher |
//! | [`launcher`] | Chrome process spawn and endpoint discovery |
//! | [`tools`] | Result envelope for the outer tool shell |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Chrome process launching and endpoint discovery.
pub mod launcher;

/// Shared URL pattern matching (`*`, `/regex/`, globs).
pub mod pattern;

/// CDP wire message types.
///
/// Envelope structs and typed event payloads (internal wire layer).
pub mod protocol;

/// Debugging session facade.
///
/// [`Session`] owns the transport and every projection.
pub mod session;

/// In-memory state projections over the event stream.
pub mod state;

/// Tool result envelope for the outer shell.
pub mod tools;

/// WebSocket transport layer.
///
/// Correlated JSON-RPC with per-request deadlines (internal wire layer).
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{
    BreakpointId, CallFrameId, CallId, RequestId, ScriptId, SessionId, TargetId,
};

// Launcher types
pub use launcher::{ChromeProcess, LaunchOptions, find_chrome, launch};

// Session types
pub use session::{
    BreakpointAware, CaptureOutcome, EvaluateOptions, EvaluateOutcome, LogEntry, PauseNotice,
    Session, SessionConfig, TargetInfo, VersionInfo,
};

// State types
pub use state::{
    CollectedException, ConsoleMessage, ConsoleState, DebugState, FetchInterceptor, InterceptRule,
    ManagedBreakpoint, NetworkRequest, NetworkState, PausedRequest, RequestPhase, RuleAction,
    RuleSpec, ScriptInfo, ScriptRegistry,
};

// Tool envelope
pub use tools::{ToolContent, ToolResult};

// Transport
pub use transport::Transport;
