//! In-memory state projections over the event stream.
//!
//! Each projection is an independent container fed by routed events and
//! queried by the session facade. Projections are bounded where the event
//! stream is unbounded; the oldest entries are evicted silently.
//!
//! All projections accept events whether or not the corresponding CDP domain
//! is enabled. The enabled flag gates the subscription and the disable-time
//! reset, not the container's willingness to record.
//!
//! Query methods hand out defensive snapshots, never references into the
//! stored state.
//!
//! # Projections
//!
//! | Module | Container | Fed by |
//! |--------|-----------|--------|
//! | `debugger` | [`DebugState`] | `Debugger.paused` / `resumed` / `breakpointResolved` |
//! | `scripts` | [`ScriptRegistry`] | `Debugger.scriptParsed` |
//! | `network` | [`NetworkState`] | `Network.*` lifecycle events |
//! | `console` | [`ConsoleState`] | `Runtime.consoleAPICalled` / `exceptionThrown` |
//! | `fetch` | [`FetchInterceptor`] | `Fetch.requestPaused` |

// ============================================================================
// Submodules
// ============================================================================

mod console;
mod debugger;
mod fetch;
mod network;
mod scripts;

// ============================================================================
// Re-exports
// ============================================================================

pub use console::{CollectedException, ConsoleMessage, ConsoleState};
pub use debugger::{DebugState, ManagedBreakpoint, PauseSnapshot, PauseState};
pub use fetch::{FetchInterceptor, InterceptRule, PausedRequest, RuleAction, RuleSpec};
pub use network::{NetworkRequest, NetworkState, RequestPhase};
pub use scripts::{ScriptInfo, ScriptRegistry};
