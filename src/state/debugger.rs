//! Debugger pause state and managed breakpoints.
//!
//! [`DebugState`] tracks whether execution is paused, the call stack at the
//! pause point, and every breakpoint the session manages. Pause events
//! overwrite the current state; `Debugger.resumed` resets it. Disabling the
//! debugger resets to running and drops all managed breakpoints.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::identifiers::BreakpointId;
use crate::protocol::{CallFrame, ScriptLocation};

// ============================================================================
// PauseState
// ============================================================================

/// Execution state of the debugged target.
#[derive(Debug, Clone, Default)]
pub enum PauseState {
    /// Execution is running.
    #[default]
    Running,

    /// Execution is paused. `call_frames` is non-empty on a real pause.
    Paused {
        /// Pause reason (`breakpoint`, `exception`, `other`, …).
        reason: String,
        /// Call stack, innermost frame first.
        call_frames: Vec<CallFrame>,
        /// Breakpoints that triggered the pause.
        hit_breakpoints: Vec<BreakpointId>,
        /// Reason-specific auxiliary data.
        data: Option<Value>,
        /// Async stack trace, when enabled.
        async_stack_trace: Option<Value>,
    },
}

// ============================================================================
// PauseSnapshot
// ============================================================================

/// Defensive copy of a pause, handed to callers.
#[derive(Debug, Clone)]
pub struct PauseSnapshot {
    /// Pause reason.
    pub reason: String,
    /// Call stack at the pause point.
    pub call_frames: Vec<CallFrame>,
    /// Breakpoints that triggered the pause.
    pub hit_breakpoints: Vec<BreakpointId>,
    /// Reason-specific auxiliary data.
    pub data: Option<Value>,
    /// Async stack trace, when enabled.
    pub async_stack_trace: Option<Value>,
}

// ============================================================================
// ManagedBreakpoint
// ============================================================================

/// A breakpoint the session created and tracks.
///
/// Mutated only by `Debugger.breakpointResolved` (appends a location) and by
/// explicit user operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedBreakpoint {
    /// Breakpoint identifier assigned by Chrome.
    pub id: BreakpointId,

    /// Exact URL the breakpoint was set against, if URL-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// URL regex the breakpoint was set against, if regex-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_regex: Option<String>,

    /// Script the breakpoint was set in, if location-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<crate::identifiers::ScriptId>,

    /// Zero-based line number.
    pub line_number: u32,

    /// Zero-based column number, if specified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,

    /// Conditional expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Concrete locations Chrome bound the breakpoint to.
    pub resolved_locations: Vec<ScriptLocation>,

    /// Whether the breakpoint is active.
    pub enabled: bool,
}

// ============================================================================
// DebugState
// ============================================================================

/// Debugger domain projection.
#[derive(Debug, Default)]
pub struct DebugState {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    enabled: bool,
    pause: PauseState,
    breakpoints: Vec<ManagedBreakpoint>,
    pause_on_exceptions: String,
    async_stack_depth: u32,
}

impl DebugState {
    /// Creates an empty debug state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                pause_on_exceptions: "none".to_string(),
                ..Inner::default()
            }),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mirrors the CDP domain enabled flag.
    ///
    /// Disabling resets to running and drops all managed breakpoints.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.pause = PauseState::Running;
            inner.breakpoints.clear();
        }
    }

    /// Returns whether the debugger domain is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Clears everything back to the initial state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner {
            pause_on_exceptions: "none".to_string(),
            ..Inner::default()
        };
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    /// Records a `Debugger.paused` event. Overwrites any previous pause.
    pub fn on_paused(
        &self,
        reason: String,
        call_frames: Vec<CallFrame>,
        hit_breakpoints: Vec<BreakpointId>,
        data: Option<Value>,
        async_stack_trace: Option<Value>,
    ) {
        debug!(%reason, frames = call_frames.len(), "Execution paused");
        self.inner.lock().pause = PauseState::Paused {
            reason,
            call_frames,
            hit_breakpoints,
            data,
            async_stack_trace,
        };
    }

    /// Records a `Debugger.resumed` event.
    pub fn on_resumed(&self) {
        debug!("Execution resumed");
        self.inner.lock().pause = PauseState::Running;
    }

    /// Appends a resolved location to the named breakpoint.
    ///
    /// Resolution for an unmanaged breakpoint is ignored.
    pub fn on_breakpoint_resolved(&self, breakpoint_id: &BreakpointId, location: ScriptLocation) {
        let mut inner = self.inner.lock();
        if let Some(bp) = inner.breakpoints.iter_mut().find(|bp| &bp.id == breakpoint_id) {
            bp.resolved_locations.push(location);
        }
    }

    // ========================================================================
    // Breakpoint Management
    // ========================================================================

    /// Tracks a newly created breakpoint.
    pub fn add_breakpoint(&self, breakpoint: ManagedBreakpoint) {
        self.inner.lock().breakpoints.push(breakpoint);
    }

    /// Forgets a breakpoint. Returns `false` if it was not managed.
    pub fn remove_breakpoint(&self, breakpoint_id: &BreakpointId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.breakpoints.len();
        inner.breakpoints.retain(|bp| &bp.id != breakpoint_id);
        inner.breakpoints.len() != before
    }

    /// Flips the enabled flag of a managed breakpoint.
    pub fn set_breakpoint_enabled(&self, breakpoint_id: &BreakpointId, enabled: bool) -> bool {
        let mut inner = self.inner.lock();
        match inner.breakpoints.iter_mut().find(|bp| &bp.id == breakpoint_id) {
            Some(bp) => {
                bp.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns a snapshot of all managed breakpoints, in creation order.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<ManagedBreakpoint> {
        self.inner.lock().breakpoints.clone()
    }

    /// Returns the number of managed breakpoints.
    #[must_use]
    pub fn breakpoint_count(&self) -> usize {
        self.inner.lock().breakpoints.len()
    }

    // ========================================================================
    // Pause Queries
    // ========================================================================

    /// Returns `true` while execution is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.inner.lock().pause, PauseState::Paused { .. })
    }

    /// Returns the pause reason, or `None` while running.
    #[must_use]
    pub fn pause_reason(&self) -> Option<String> {
        match &self.inner.lock().pause {
            PauseState::Paused { reason, .. } => Some(reason.clone()),
            PauseState::Running => None,
        }
    }

    /// Returns a snapshot of the current pause, or `None` while running.
    #[must_use]
    pub fn pause_snapshot(&self) -> Option<PauseSnapshot> {
        match &self.inner.lock().pause {
            PauseState::Paused {
                reason,
                call_frames,
                hit_breakpoints,
                data,
                async_stack_trace,
            } => Some(PauseSnapshot {
                reason: reason.clone(),
                call_frames: call_frames.clone(),
                hit_breakpoints: hit_breakpoints.clone(),
                data: data.clone(),
                async_stack_trace: async_stack_trace.clone(),
            }),
            PauseState::Running => None,
        }
    }

    /// Returns a snapshot of the paused call stack. Empty while running.
    #[must_use]
    pub fn call_frames(&self) -> Vec<CallFrame> {
        match &self.inner.lock().pause {
            PauseState::Paused { call_frames, .. } => call_frames.clone(),
            PauseState::Running => Vec::new(),
        }
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Records the pause-on-exceptions mode (`none`, `caught`, `uncaught`, `all`).
    pub fn set_pause_on_exceptions(&self, mode: impl Into<String>) {
        self.inner.lock().pause_on_exceptions = mode.into();
    }

    /// Records the async stack trace depth.
    pub fn set_async_stack_depth(&self, depth: u32) {
        self.inner.lock().async_stack_depth = depth;
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Summarizes the projection for tool output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.inner.lock();
        let (is_paused, reason, frame_count) = match &inner.pause {
            PauseState::Paused {
                reason,
                call_frames,
                ..
            } => (true, Some(reason.clone()), call_frames.len()),
            PauseState::Running => (false, None, 0),
        };

        json!({
            "enabled": inner.enabled,
            "isPaused": is_paused,
            "pauseReason": reason,
            "callFrameCount": frame_count,
            "breakpointCount": inner.breakpoints.len(),
            "pauseOnExceptions": inner.pause_on_exceptions,
            "asyncStackTraceDepth": inner.async_stack_depth,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::{CallFrameId, ScriptId};

    fn frame(name: &str) -> CallFrame {
        CallFrame {
            call_frame_id: CallFrameId::new("frame-0"),
            function_name: name.to_string(),
            location: ScriptLocation {
                script_id: ScriptId::new("1"),
                line_number: 4,
                column_number: 0,
            },
            url: "http://x/p.html".to_string(),
            raw: Value::Null,
        }
    }

    fn breakpoint(id: &str) -> ManagedBreakpoint {
        ManagedBreakpoint {
            id: BreakpointId::new(id),
            url: Some("http://x/p.html".to_string()),
            url_regex: None,
            script_id: None,
            line_number: 4,
            column_number: None,
            condition: None,
            resolved_locations: Vec::new(),
            enabled: true,
        }
    }

    #[test]
    fn test_initial_json_shape() {
        let state = DebugState::new();
        let json = state.to_json();

        assert_eq!(json["enabled"], false);
        assert_eq!(json["isPaused"], false);
        assert!(json["pauseReason"].is_null());
        assert_eq!(json["callFrameCount"], 0);
        assert_eq!(json["breakpointCount"], 0);
        assert_eq!(json["pauseOnExceptions"], "none");
        assert_eq!(json["asyncStackTraceDepth"], 0);
    }

    #[test]
    fn test_pause_and_resume() {
        let state = DebugState::new();

        state.on_paused(
            "breakpoint".to_string(),
            vec![frame("targetFunction")],
            vec![BreakpointId::new("bp:1")],
            None,
            None,
        );

        assert!(state.is_paused());
        assert_eq!(state.pause_reason().as_deref(), Some("breakpoint"));
        assert_eq!(state.call_frames().len(), 1);

        state.on_resumed();

        assert!(!state.is_paused());
        assert!(state.pause_reason().is_none());
        assert!(state.call_frames().is_empty());
    }

    #[test]
    fn test_pause_overwrites_previous_pause() {
        let state = DebugState::new();

        state.on_paused("breakpoint".into(), vec![frame("a")], vec![], None, None);
        state.on_paused(
            "exception".into(),
            vec![frame("b"), frame("c")],
            vec![],
            None,
            None,
        );

        assert_eq!(state.pause_reason().as_deref(), Some("exception"));
        assert_eq!(state.call_frames().len(), 2);
    }

    #[test]
    fn test_breakpoint_resolution_appends() {
        let state = DebugState::new();
        state.add_breakpoint(breakpoint("bp:1"));

        let location = ScriptLocation {
            script_id: ScriptId::new("55"),
            line_number: 4,
            column_number: 12,
        };
        state.on_breakpoint_resolved(&BreakpointId::new("bp:1"), location.clone());
        state.on_breakpoint_resolved(
            &BreakpointId::new("bp:1"),
            ScriptLocation {
                script_id: ScriptId::new("56"),
                line_number: 4,
                column_number: 12,
            },
        );

        let bps = state.breakpoints();
        assert_eq!(bps.len(), 1);
        assert_eq!(bps[0].resolved_locations.len(), 2);
        assert_eq!(bps[0].resolved_locations[0], location);
    }

    #[test]
    fn test_resolution_for_unmanaged_breakpoint_is_ignored() {
        let state = DebugState::new();
        state.on_breakpoint_resolved(
            &BreakpointId::new("bp:unknown"),
            ScriptLocation {
                script_id: ScriptId::new("1"),
                line_number: 0,
                column_number: 0,
            },
        );
        assert_eq!(state.breakpoint_count(), 0);
    }

    #[test]
    fn test_disable_clears_pause_and_breakpoints() {
        let state = DebugState::new();
        state.set_enabled(true);
        state.add_breakpoint(breakpoint("bp:1"));
        state.on_paused("other".into(), vec![frame("f")], vec![], None, None);

        state.set_enabled(false);

        assert!(!state.is_enabled());
        assert!(!state.is_paused());
        assert_eq!(state.breakpoint_count(), 0);
    }

    #[test]
    fn test_remove_breakpoint() {
        let state = DebugState::new();
        state.add_breakpoint(breakpoint("bp:1"));
        state.add_breakpoint(breakpoint("bp:2"));

        assert!(state.remove_breakpoint(&BreakpointId::new("bp:1")));
        assert!(!state.remove_breakpoint(&BreakpointId::new("bp:1")));
        assert_eq!(state.breakpoint_count(), 1);
    }

    #[test]
    fn test_snapshot_is_defensive() {
        let state = DebugState::new();
        state.on_paused("other".into(), vec![frame("f")], vec![], None, None);

        let mut snapshot = state.call_frames();
        snapshot.clear();

        assert_eq!(state.call_frames().len(), 1);
    }

    #[test]
    fn test_reset_restores_initial_modes() {
        let state = DebugState::new();
        state.set_enabled(true);
        state.set_pause_on_exceptions("all");
        state.set_async_stack_depth(32);

        state.reset();

        let json = state.to_json();
        assert_eq!(json["enabled"], false);
        assert_eq!(json["pauseOnExceptions"], "none");
        assert_eq!(json["asyncStackTraceDepth"], 0);
    }
}
