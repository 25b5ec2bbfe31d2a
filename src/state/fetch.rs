//! Fetch interception rule engine and paused-request table.
//!
//! Rules select which requests Chrome pauses and advise what to do with
//! them; the engine never auto-dispatches. Every paused request waits in the
//! table until the caller continues, fulfills, or fails it.
//!
//! Rule IDs (`rule-N`) come from a counter that only [`FetchInterceptor::
//! reset`] rewinds; removing a rule never frees its id for reuse.

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::identifiers::RequestId;
use crate::pattern::{MatchMode, UrlPattern};

// ============================================================================
// RuleAction
// ============================================================================

/// Advisory action attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    /// Hold the request for a manual decision.
    Pause,
    /// Continue with modified headers or URL.
    Modify,
    /// Fulfill with a synthetic response.
    Mock,
    /// Fail with a network error.
    Fail,
}

// ============================================================================
// RuleSpec
// ============================================================================

/// Input for creating a rule; the engine assigns the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// URL pattern (`*`, `/regex/`, or glob; anchored full match).
    pub pattern: String,

    /// Resource types the rule applies to; empty means all.
    #[serde(default)]
    pub resource_types: Vec<String>,

    /// Advisory action.
    pub action: RuleAction,

    /// Header overrides for `modify`.
    #[serde(default)]
    pub modify_headers: Option<Value>,

    /// URL override for `modify`.
    #[serde(default)]
    pub modify_url: Option<String>,

    /// Synthetic response for `mock`.
    #[serde(default)]
    pub mock_response: Option<Value>,

    /// Error reason for `fail`.
    #[serde(default)]
    pub fail_reason: Option<String>,

    /// Whether the rule starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

// ============================================================================
// InterceptRule
// ============================================================================

/// A stored interception rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptRule {
    /// Rule identifier (`rule-N`).
    pub id: String,
    /// URL pattern.
    pub pattern: String,
    /// Resource types the rule applies to; empty means all.
    pub resource_types: Vec<String>,
    /// Advisory action.
    pub action: RuleAction,
    /// Header overrides for `modify`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_headers: Option<Value>,
    /// URL override for `modify`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_url: Option<String>,
    /// Synthetic response for `mock`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<Value>,
    /// Error reason for `fail`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
    /// Whether the rule is active.
    pub enabled: bool,
}

impl InterceptRule {
    /// Returns `true` if the rule applies to the URL and resource type.
    #[must_use]
    pub fn matches(&self, url: &str, resource_type: &str) -> bool {
        if !self.resource_types.is_empty()
            && !self
                .resource_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(resource_type))
        {
            return false;
        }
        UrlPattern::compile(&self.pattern, MatchMode::Full).matches(url)
    }
}

// ============================================================================
// PausedRequest
// ============================================================================

/// A fetch held between `Fetch.requestPaused` and a dispatch decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedRequest {
    /// Interception request identifier.
    pub request_id: RequestId,
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Resource type.
    pub resource_type: String,
    /// Request headers as a JSON object.
    pub headers: Value,
    /// Request body, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    /// Wall-clock pause time in epoch milliseconds.
    pub timestamp: u64,
    /// Id of the first matching rule, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<String>,
}

// ============================================================================
// FetchInterceptor
// ============================================================================

/// Fetch domain projection and rule engine.
#[derive(Debug, Default)]
pub struct FetchInterceptor {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    enabled: bool,
    rules: Vec<InterceptRule>,
    next_rule_id: u64,
    paused: Vec<PausedRequest>,
}

impl FetchInterceptor {
    /// Creates an empty interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mirrors the CDP domain enabled flag. Disabling clears the paused
    /// table; rules survive so re-enabling restores interception.
    pub fn set_enabled(&self, enabled: bool) {
        let mut inner = self.inner.lock();
        inner.enabled = enabled;
        if !enabled {
            inner.paused.clear();
        }
    }

    /// Returns whether the domain is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Clears rules, the id counter, and the paused table.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.rules.clear();
        inner.paused.clear();
        inner.next_rule_id = 0;
        inner.enabled = false;
    }

    // ========================================================================
    // Rule Management
    // ========================================================================

    /// Adds a rule and returns it with its assigned id.
    pub fn add_rule(&self, spec: RuleSpec) -> InterceptRule {
        let mut inner = self.inner.lock();
        inner.next_rule_id += 1;
        let rule = InterceptRule {
            id: format!("rule-{}", inner.next_rule_id),
            pattern: spec.pattern,
            resource_types: spec.resource_types,
            action: spec.action,
            modify_headers: spec.modify_headers,
            modify_url: spec.modify_url,
            mock_response: spec.mock_response,
            fail_reason: spec.fail_reason,
            enabled: spec.enabled,
        };
        debug!(rule_id = %rule.id, pattern = %rule.pattern, "Intercept rule added");
        inner.rules.push(rule.clone());
        rule
    }

    /// Removes a rule. Returns `false` if the id is unknown.
    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.rules.len();
        inner.rules.retain(|r| r.id != rule_id);
        inner.rules.len() != before
    }

    /// Returns a rule by id.
    #[must_use]
    pub fn get_rule(&self, rule_id: &str) -> Option<InterceptRule> {
        self.inner
            .lock()
            .rules
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
    }

    /// Flips a rule's enabled flag. Returns `false` if the id is unknown.
    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> bool {
        let mut inner = self.inner.lock();
        match inner.rules.iter_mut().find(|r| r.id == rule_id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns all rules in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<InterceptRule> {
        self.inner.lock().rules.clone()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.inner.lock().rules.len()
    }

    /// Finds the first enabled rule matching a URL and resource type.
    #[must_use]
    pub fn find_matching_rule(&self, url: &str, resource_type: &str) -> Option<InterceptRule> {
        self.inner
            .lock()
            .rules
            .iter()
            .filter(|r| r.enabled)
            .find(|r| r.matches(url, resource_type))
            .cloned()
    }

    /// Generates the deduplicated CDP pattern list for `Fetch.enable`.
    ///
    /// Rules with several resource types fan out to one pattern per type.
    /// Regex rules cannot be expressed in CDP's pattern syntax; they widen
    /// to `*` and the engine-side match refines.
    #[must_use]
    pub fn cdp_patterns(&self) -> Vec<Value> {
        let inner = self.inner.lock();
        let mut patterns: Vec<Value> = Vec::new();

        for rule in inner.rules.iter().filter(|r| r.enabled) {
            let url_pattern = if rule.pattern.starts_with('/') && rule.pattern.ends_with('/') {
                "*"
            } else {
                rule.pattern.as_str()
            };

            if rule.resource_types.is_empty() {
                push_unique(
                    &mut patterns,
                    json!({ "urlPattern": url_pattern, "requestStage": "Request" }),
                );
            } else {
                for resource_type in &rule.resource_types {
                    push_unique(
                        &mut patterns,
                        json!({
                            "urlPattern": url_pattern,
                            "resourceType": resource_type,
                            "requestStage": "Request",
                        }),
                    );
                }
            }
        }

        patterns
    }

    // ========================================================================
    // Paused-Request Lifecycle
    // ========================================================================

    /// Records a paused request, tagging it with the first matching rule.
    pub fn on_request_paused(
        &self,
        request_id: RequestId,
        url: String,
        method: String,
        resource_type: String,
        headers: Value,
        post_data: Option<String>,
    ) {
        let matched_rule = self
            .find_matching_rule(&url, &resource_type)
            .map(|r| r.id);

        debug!(request_id = %request_id, %url, ?matched_rule, "Request paused");

        let mut inner = self.inner.lock();
        inner.paused.push(PausedRequest {
            request_id,
            url,
            method,
            resource_type,
            headers,
            post_data,
            timestamp: epoch_millis(),
            matched_rule,
        });
    }

    /// Removes and returns a paused request.
    ///
    /// `None` means the id is unknown and no CDP call should be made.
    pub fn take_paused(&self, request_id: &RequestId) -> Option<PausedRequest> {
        let mut inner = self.inner.lock();
        let index = inner
            .paused
            .iter()
            .position(|p| &p.request_id == request_id)?;
        Some(inner.paused.remove(index))
    }

    /// Returns a paused request without removing it.
    #[must_use]
    pub fn get_paused(&self, request_id: &RequestId) -> Option<PausedRequest> {
        self.inner
            .lock()
            .paused
            .iter()
            .find(|p| &p.request_id == request_id)
            .cloned()
    }

    /// Returns all paused requests in arrival order.
    #[must_use]
    pub fn paused_requests(&self) -> Vec<PausedRequest> {
        self.inner.lock().paused.clone()
    }

    /// Returns the number of paused requests.
    #[must_use]
    pub fn paused_count(&self) -> usize {
        self.inner.lock().paused.len()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Appends a pattern if an equal one is not already present.
fn push_unique(patterns: &mut Vec<Value>, pattern: Value) {
    if !patterns.contains(&pattern) {
        patterns.push(pattern);
    }
}

/// Wall-clock time in epoch milliseconds.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
