//! Breakpoints, stepping, pause control, and script sources.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{BreakpointId, ScriptId};
use crate::protocol::{CallFrame, ScriptLocation};
use crate::state::{ManagedBreakpoint, ScriptInfo};

use super::core::Session;

// ============================================================================
// Session - Domain Lifecycle
// ============================================================================

impl Session {
    /// Enables the debugger domain.
    pub async fn enable_debugger(&self) -> Result<()> {
        self.send("Debugger.enable", None).await?;
        self.debug.set_enabled(true);
        Ok(())
    }

    /// Disables the debugger domain.
    ///
    /// Resets the pause state and drops every managed breakpoint.
    pub async fn disable_debugger(&self) -> Result<()> {
        self.send("Debugger.disable", None).await?;
        self.debug.set_enabled(false);
        Ok(())
    }
}

// ============================================================================
// Session - Breakpoints
// ============================================================================

impl Session {
    /// Sets a breakpoint by URL or URL regex.
    ///
    /// Chrome binds the breakpoint to concrete locations as matching scripts
    /// parse; resolutions append to the returned breakpoint's
    /// `resolved_locations` over time.
    ///
    /// # Errors
    ///
    /// - [`Error::BreakpointSpecInvalid`] when neither `url` nor `url_regex`
    ///   is given
    pub async fn set_breakpoint_by_url(
        &self,
        url: Option<&str>,
        url_regex: Option<&str>,
        line_number: u32,
        column_number: Option<u32>,
        condition: Option<&str>,
    ) -> Result<ManagedBreakpoint> {
        if url.is_none() && url_regex.is_none() {
            return Err(Error::BreakpointSpecInvalid);
        }

        let mut params = json!({ "lineNumber": line_number });
        if let Some(url) = url {
            params["url"] = json!(url);
        }
        if let Some(url_regex) = url_regex {
            params["urlRegex"] = json!(url_regex);
        }
        if let Some(column_number) = column_number {
            params["columnNumber"] = json!(column_number);
        }
        if let Some(condition) = condition {
            params["condition"] = json!(condition);
        }

        let result = self.send("Debugger.setBreakpointByUrl", Some(params)).await?;

        let breakpoint = ManagedBreakpoint {
            id: breakpoint_id(&result)?,
            url: url.map(ToString::to_string),
            url_regex: url_regex.map(ToString::to_string),
            script_id: None,
            line_number,
            column_number,
            condition: condition.map(ToString::to_string),
            resolved_locations: locations(&result, "locations"),
            enabled: true,
        };

        debug!(id = %breakpoint.id, line_number, "Breakpoint set by URL");
        self.debug.add_breakpoint(breakpoint.clone());
        Ok(breakpoint)
    }

    /// Sets a breakpoint at a concrete script location.
    pub async fn set_breakpoint_at(
        &self,
        script_id: &ScriptId,
        line_number: u32,
        column_number: Option<u32>,
        condition: Option<&str>,
    ) -> Result<ManagedBreakpoint> {
        let mut location = json!({
            "scriptId": script_id,
            "lineNumber": line_number,
        });
        if let Some(column_number) = column_number {
            location["columnNumber"] = json!(column_number);
        }

        let mut params = json!({ "location": location });
        if let Some(condition) = condition {
            params["condition"] = json!(condition);
        }

        let result = self.send("Debugger.setBreakpoint", Some(params)).await?;

        let resolved = result
            .get("actualLocation")
            .map(ScriptLocation::from_value)
            .into_iter()
            .collect();

        let breakpoint = ManagedBreakpoint {
            id: breakpoint_id(&result)?,
            url: None,
            url_regex: None,
            script_id: Some(script_id.clone()),
            line_number,
            column_number,
            condition: condition.map(ToString::to_string),
            resolved_locations: resolved,
            enabled: true,
        };

        debug!(id = %breakpoint.id, script_id = %script_id, line_number, "Breakpoint set");
        self.debug.add_breakpoint(breakpoint.clone());
        Ok(breakpoint)
    }

    /// Removes a breakpoint.
    pub async fn remove_breakpoint(&self, breakpoint_id: &BreakpointId) -> Result<()> {
        self.send(
            "Debugger.removeBreakpoint",
            Some(json!({ "breakpointId": breakpoint_id })),
        )
        .await?;
        self.debug.remove_breakpoint(breakpoint_id);
        Ok(())
    }

    /// Activates or deactivates all breakpoints without removing them.
    pub async fn set_breakpoints_active(&self, active: bool) -> Result<()> {
        self.send(
            "Debugger.setBreakpointsActive",
            Some(json!({ "active": active })),
        )
        .await
        .map(|_| ())
    }

    /// Returns all managed breakpoints.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<ManagedBreakpoint> {
        self.debug.breakpoints()
    }
}

// ============================================================================
// Session - Pause Control
// ============================================================================

impl Session {
    /// Requests a pause at the next statement.
    pub async fn pause(&self) -> Result<()> {
        self.send("Debugger.pause", None).await.map(|_| ())
    }

    /// Resumes execution.
    pub async fn resume(&self) -> Result<()> {
        self.send("Debugger.resume", None).await.map(|_| ())
    }

    /// Steps over the next statement.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPaused`] while execution is running
    pub async fn step_over(&self) -> Result<()> {
        self.step("Debugger.stepOver").await
    }

    /// Steps into the next call.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPaused`] while execution is running
    pub async fn step_into(&self) -> Result<()> {
        self.step("Debugger.stepInto").await
    }

    /// Steps out of the current frame.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPaused`] while execution is running
    pub async fn step_out(&self) -> Result<()> {
        self.step("Debugger.stepOut").await
    }

    async fn step(&self, method: &str) -> Result<()> {
        if !self.debug.is_paused() {
            return Err(Error::NotPaused);
        }
        self.send(method, None).await.map(|_| ())
    }

    /// Returns a full snapshot of the current pause, or `None` while
    /// running.
    #[must_use]
    pub fn pause_snapshot(&self) -> Option<crate::state::PauseSnapshot> {
        self.debug.pause_snapshot()
    }

    /// Returns the paused call stack.
    ///
    /// # Errors
    ///
    /// - [`Error::NotPaused`] while execution is running
    pub fn call_frames(&self) -> Result<Vec<CallFrame>> {
        if !self.debug.is_paused() {
            return Err(Error::NotPaused);
        }
        Ok(self.debug.call_frames())
    }

    /// Sets the pause-on-exceptions mode.
    ///
    /// `mode` is one of `none`, `caught`, `uncaught`, `all`.
    pub async fn set_pause_on_exceptions(&self, mode: &str) -> Result<()> {
        self.send(
            "Debugger.setPauseOnExceptions",
            Some(json!({ "state": mode })),
        )
        .await?;
        self.debug.set_pause_on_exceptions(mode);
        Ok(())
    }

    /// Sets the async call stack depth reported on pauses.
    pub async fn set_async_stack_depth(&self, max_depth: u32) -> Result<()> {
        self.send(
            "Debugger.setAsyncCallStackDepth",
            Some(json!({ "maxDepth": max_depth })),
        )
        .await?;
        self.debug.set_async_stack_depth(max_depth);
        Ok(())
    }
}

// ============================================================================
// Session - Scripts
// ============================================================================

impl Session {
    /// Returns the source of a parsed script, fetching and caching it on
    /// first use.
    ///
    /// # Errors
    ///
    /// - [`Error::ScriptNotFound`] for an id the registry has never seen
    pub async fn get_script_source(&self, script_id: &ScriptId) -> Result<String> {
        if self.scripts.get(script_id).is_none() {
            return Err(Error::script_not_found(script_id.clone()));
        }

        if let Some(source) = self.scripts.cached_source(script_id) {
            return Ok(source);
        }

        let result = self
            .send(
                "Debugger.getScriptSource",
                Some(json!({ "scriptId": script_id })),
            )
            .await?;

        let source = result
            .get("scriptSource")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        self.scripts.cache_source(script_id.clone(), source.clone());
        Ok(source)
    }

    /// Returns every parsed script.
    #[must_use]
    pub fn list_scripts(&self) -> Vec<ScriptInfo> {
        self.scripts.all()
    }

    /// Returns scripts whose URL matches the pattern.
    #[must_use]
    pub fn search_scripts(&self, pattern: &str) -> Vec<ScriptInfo> {
        self.scripts.get_by_url(pattern)
    }

    /// Finds the script covering a URL and line, falling back to the first
    /// script registered for the URL.
    #[must_use]
    pub fn find_script_for_location(&self, url: &str, line_number: u32) -> Option<ScriptInfo> {
        self.scripts.find_script_for_location(url, line_number)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extracts the breakpoint id from a set-breakpoint response.
fn breakpoint_id(result: &Value) -> Result<BreakpointId> {
    result
        .get("breakpointId")
        .and_then(Value::as_str)
        .map(BreakpointId::new)
        .ok_or_else(|| Error::decode("setBreakpoint response missing breakpointId"))
}

/// Extracts a location array from a set-breakpoint response.
fn locations(result: &Value, key: &str) -> Vec<ScriptLocation> {
    result
        .get(key)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(ScriptLocation::from_value).collect())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::session::SessionConfig;

    #[tokio::test]
    async fn test_breakpoint_spec_requires_url_or_regex() {
        let session = Session::new(SessionConfig::default());
        let err = session
            .set_breakpoint_by_url(None, None, 4, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BreakpointSpecInvalid));
    }

    #[tokio::test]
    async fn test_step_requires_pause() {
        let session = Session::new(SessionConfig::default());
        assert!(matches!(
            session.step_over().await.unwrap_err(),
            Error::NotPaused
        ));
        assert!(matches!(
            session.step_into().await.unwrap_err(),
            Error::NotPaused
        ));
        assert!(matches!(
            session.step_out().await.unwrap_err(),
            Error::NotPaused
        ));
    }

    #[test]
    fn test_call_frames_require_pause() {
        let session = Session::new(SessionConfig::default());
        assert!(matches!(
            session.call_frames().unwrap_err(),
            Error::NotPaused
        ));
    }

    #[tokio::test]
    async fn test_script_source_unknown_id() {
        let session = Session::new(SessionConfig::default());
        let err = session
            .get_script_source(&ScriptId::new("404"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ScriptNotFound { .. }));
    }

    #[test]
    fn test_breakpoint_id_extraction() {
        let id = breakpoint_id(&json!({ "breakpointId": "bp:4:0" })).expect("present");
        assert_eq!(id, BreakpointId::new("bp:4:0"));
        assert!(breakpoint_id(&json!({})).is_err());
    }

    #[test]
    fn test_locations_extraction() {
        let parsed = locations(
            &json!({ "locations": [
                { "scriptId": "1", "lineNumber": 4, "columnNumber": 0 },
                { "scriptId": "2", "lineNumber": 4, "columnNumber": 8 }
            ]}),
            "locations",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].column_number, 8);
    }
}
