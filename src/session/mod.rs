//! Debugging session facade.
//!
//! A [`Session`] owns the transport and all state projections, and maps each
//! tool-level operation onto one or more protocol calls. Nothing else may
//! mutate the projections; callers read them through facade queries that
//! return defensive snapshots.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Session configuration knobs |
//! | `core` | Session struct, lifecycle, connection handling |
//! | `router` | Event routing into the projections |
//! | `logs` | Bounded browser log buffer |
//! | `eval` | Pause-aware evaluation and the detection window |
//! | `debugger` | Breakpoints, stepping, pause control, script sources |
//! | `network` | Request table queries, response bodies |
//! | `fetch` | Interception rules and paused-request dispatch |
//! | `console` | Console message and exception queries |
//! | `page` | Navigation, screenshots, page snapshots |
//! | `dom` | Document node cache, selector queries |
//! | `targets` | Target listing and switching over the HTTP endpoint |
//!
//! # Example
//!
//! ```ignore
//! let session = Session::new(SessionConfig::default());
//! session.connect("ws://127.0.0.1:9222/devtools/page/ABC").await?;
//!
//! session.enable_debugger().await?;
//! session.enable_runtime().await?;
//!
//! match session.evaluate("computeTotal()", EvaluateOptions::default()).await? {
//!     EvaluateOutcome::Value { result, .. } => println!("{result}"),
//!     EvaluateOutcome::Paused { reason, .. } => println!("paused: {reason}"),
//! }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod config;
mod console;
mod core;
mod debugger;
mod dom;
mod eval;
mod fetch;
mod logs;
mod network;
mod page;
mod router;
mod targets;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::SessionConfig;
pub use core::Session;
pub use eval::{BreakpointAware, EvaluateOptions, EvaluateOutcome};
pub use logs::LogEntry;
pub use page::CaptureOutcome;
pub use router::PauseNotice;
pub use targets::{TargetInfo, VersionInfo};
