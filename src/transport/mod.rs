//! WebSocket transport layer.
//!
//! Correlated JSON-RPC over a single DevTools WebSocket: one event-loop task
//! owns the socket, commands are funneled through a channel (FIFO on the
//! wire), responses are matched back to callers by call id, and events fan
//! out to subscribers.

// ============================================================================
// Submodules
// ============================================================================

mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{EventReceiver, Transport, DEFAULT_COMMAND_TIMEOUT};
