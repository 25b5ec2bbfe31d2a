//! Parsed script registry.
//!
//! Records every `Debugger.scriptParsed` event, indexed by script id with a
//! secondary URL index (multiple scripts may share a URL; inline scripts have
//! an empty URL). Sources are cached on first fetch. Entries live until
//! session reset; nothing is evicted individually.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::identifiers::ScriptId;
use crate::pattern::{MatchMode, UrlPattern};

// ============================================================================
// ScriptInfo
// ============================================================================

/// Record of a parse event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInfo {
    /// Script identifier.
    pub script_id: ScriptId,
    /// Script URL, empty for inline scripts.
    pub url: String,
    /// First line of the script in its resource.
    pub start_line: u32,
    /// First column of the script in its resource.
    pub start_column: u32,
    /// Last line of the script.
    pub end_line: u32,
    /// Last column of the script.
    pub end_column: u32,
    /// Execution context the script belongs to.
    pub execution_context_id: i64,
    /// Source map URL, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map_url: Option<String>,
    /// Content hash.
    pub hash: String,
}

// ============================================================================
// ScriptRegistry
// ============================================================================

/// Script projection over `Debugger.scriptParsed`.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    enabled: bool,
    scripts: FxHashMap<ScriptId, ScriptInfo>,
    /// url → script ids in parse order.
    by_url: FxHashMap<String, Vec<ScriptId>>,
    /// Source cache, populated on first `getScriptSource`.
    sources: FxHashMap<ScriptId, String>,
}

impl ScriptRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mirrors the CDP domain enabled flag. Disabling clears the registry.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.scripts.clear();
            inner.by_url.clear();
            inner.sources.clear();
        }
    }

    /// Returns whether the domain is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Clears everything.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.scripts.clear();
        inner.by_url.clear();
        inner.sources.clear();
        inner.enabled = false;
    }

    // ========================================================================
    // Event Handlers
    // ========================================================================

    /// Records a parsed script and updates the URL index.
    pub fn on_script_parsed(&self, info: ScriptInfo) {
        let mut inner = self.inner.lock();
        let ids = inner.by_url.entry(info.url.clone()).or_default();
        if !ids.contains(&info.script_id) {
            ids.push(info.script_id.clone());
        }
        inner.scripts.insert(info.script_id.clone(), info);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns the script with the given id.
    #[must_use]
    pub fn get(&self, script_id: &ScriptId) -> Option<ScriptInfo> {
        self.inner.lock().scripts.get(script_id).cloned()
    }

    /// Returns scripts whose URL matches the pattern (substring semantics).
    #[must_use]
    pub fn get_by_url(&self, pattern: &str) -> Vec<ScriptInfo> {
        let matcher = UrlPattern::compile(pattern, MatchMode::Substring);
        let inner = self.inner.lock();

        let mut found: Vec<ScriptInfo> = inner
            .scripts
            .values()
            .filter(|s| matcher.matches(&s.url))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.script_id.as_str().cmp(b.script_id.as_str()));
        found
    }

    /// Returns every known script.
    #[must_use]
    pub fn all(&self) -> Vec<ScriptInfo> {
        let inner = self.inner.lock();
        let mut scripts: Vec<ScriptInfo> = inner.scripts.values().cloned().collect();
        scripts.sort_by(|a, b| a.script_id.as_str().cmp(b.script_id.as_str()));
        scripts
    }

    /// Returns the number of known scripts.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.lock().scripts.len()
    }

    /// Finds the script for a URL and line number.
    ///
    /// Scripts registered for the URL are checked in parse order; the first
    /// whose line range covers `line_number` wins. When no script's range
    /// covers the line, the first script registered for the URL is returned
    /// even though the line lies outside it; callers rely on that fallback
    /// for URLs with a single full-document script.
    #[must_use]
    pub fn find_script_for_location(&self, url: &str, line_number: u32) -> Option<ScriptInfo> {
        let inner = self.inner.lock();
        let ids = inner.by_url.get(url)?;

        let candidates: Vec<&ScriptInfo> =
            ids.iter().filter_map(|id| inner.scripts.get(id)).collect();

        candidates
            .iter()
            .find(|s| s.start_line <= line_number && line_number <= s.end_line)
            .or_else(|| candidates.first())
            .map(|s| (*s).clone())
    }

    // ========================================================================
    // Source Cache
    // ========================================================================

    /// Returns the cached source for a script, if fetched before.
    #[must_use]
    pub fn cached_source(&self, script_id: &ScriptId) -> Option<String> {
        self.inner.lock().sources.get(script_id).cloned()
    }

    /// Caches a fetched source.
    pub fn cache_source(&self, script_id: ScriptId, source: String) {
        self.inner.lock().sources.insert(script_id, source);
    }
}

// ============================================================================
// Tests
// ============================================================================
