//! CDP wire message types.
//!
//! This module defines the message format exchanged with a Chromium-based
//! browser over the DevTools WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `MethodCall` | Local → Browser | Command request |
//! | `Response` | Browser → Local | Command response, matched by `id` |
//! | `EventMessage` | Browser → Local | Event notification (no `id`) |
//!
//! # Method Naming
//!
//! Methods follow `Domain.command` / `Domain.event` format:
//!
//! - `Runtime.evaluate`
//! - `Debugger.paused`
//! - `Fetch.requestPaused`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Command, response, and event envelopes |
//! | `event` | Typed event payloads for the state projections |

// ============================================================================
// Submodules
// ============================================================================

/// Command, response, and event envelopes.
pub mod message;

/// Typed event payloads.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{CallFrame, CdpEvent, ScriptLocation};
pub use message::{EventMessage, Message, MethodCall, ProtocolError, Response};
