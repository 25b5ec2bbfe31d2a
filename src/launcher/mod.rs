//! Chrome process launching and endpoint discovery.
//!
//! The launcher locates a Chrome executable, spawns it with debugging flags,
//! scrapes the DevTools endpoint from its standard error, and terminates it
//! cleanly. The session engine treats all of this as a collaborator behind
//! [`launch`] and [`ChromeProcess`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `locate` | Best-effort executable discovery |
//! | `options` | Launch flags and configuration |
//! | `process` | Process spawn, endpoint parse, guarded shutdown |

// ============================================================================
// Submodules
// ============================================================================

mod locate;
mod options;
mod process;

// ============================================================================
// Re-exports
// ============================================================================

pub use locate::find_chrome;
pub use options::LaunchOptions;
pub use process::{ChromeProcess, launch};
