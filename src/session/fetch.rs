//! Interception rules and paused-request dispatch.
//!
//! Rules advise; the caller decides. Every paused request waits until the
//! caller continues, fulfills, or fails it explicitly.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::state::{InterceptRule, PausedRequest, RuleSpec};

use super::core::Session;

// ============================================================================
// Session - Interception Lifecycle
// ============================================================================

impl Session {
    /// Enables fetch interception with the patterns generated from the
    /// enabled rule set.
    ///
    /// Rule changes take effect on the next `enable_fetch` call; Chrome only
    /// re-reads patterns then.
    pub async fn enable_fetch(&self) -> Result<()> {
        let patterns = self.fetch.cdp_patterns();
        self.send("Fetch.enable", Some(json!({ "patterns": patterns })))
            .await?;
        self.fetch.set_enabled(true);
        Ok(())
    }

    /// Disables fetch interception and clears the paused table.
    pub async fn disable_fetch(&self) -> Result<()> {
        self.send("Fetch.disable", None).await?;
        self.fetch.set_enabled(false);
        Ok(())
    }
}

// ============================================================================
// Session - Rules
// ============================================================================

impl Session {
    /// Adds an interception rule and returns it with its assigned id.
    pub fn add_intercept_rule(&self, spec: RuleSpec) -> InterceptRule {
        self.fetch.add_rule(spec)
    }

    /// Removes a rule.
    ///
    /// # Errors
    ///
    /// - [`Error::RuleNotFound`] for an unknown id
    pub fn remove_intercept_rule(&self, rule_id: &str) -> Result<()> {
        if self.fetch.remove_rule(rule_id) {
            Ok(())
        } else {
            Err(Error::rule_not_found(rule_id))
        }
    }

    /// Returns a rule by id.
    ///
    /// # Errors
    ///
    /// - [`Error::RuleNotFound`] for an unknown id
    pub fn get_intercept_rule(&self, rule_id: &str) -> Result<InterceptRule> {
        self.fetch
            .get_rule(rule_id)
            .ok_or_else(|| Error::rule_not_found(rule_id))
    }

    /// Enables or disables a rule.
    ///
    /// # Errors
    ///
    /// - [`Error::RuleNotFound`] for an unknown id
    pub fn set_intercept_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<()> {
        if self.fetch.set_rule_enabled(rule_id, enabled) {
            Ok(())
        } else {
            Err(Error::rule_not_found(rule_id))
        }
    }

    /// Returns all rules in insertion order.
    #[must_use]
    pub fn intercept_rules(&self) -> Vec<InterceptRule> {
        self.fetch.rules()
    }

    /// Returns all paused requests in arrival order.
    #[must_use]
    pub fn paused_requests(&self) -> Vec<PausedRequest> {
        self.fetch.paused_requests()
    }
}

// ============================================================================
// Session - Paused-Request Dispatch
// ============================================================================

impl Session {
    /// Continues a paused request, optionally overriding URL or headers.
    ///
    /// # Errors
    ///
    /// - [`Error::PausedRequestNotFound`] for an unknown id; no protocol
    ///   call is made
    pub async fn continue_request(
        &self,
        request_id: &RequestId,
        url: Option<&str>,
        headers: Option<&[(String, String)]>,
    ) -> Result<()> {
        self.require_paused_request(request_id)?;

        let mut params = json!({ "requestId": request_id });
        if let Some(url) = url {
            params["url"] = json!(url);
        }
        if let Some(headers) = headers {
            params["headers"] = header_entries(headers);
        }

        self.send("Fetch.continueRequest", Some(params)).await?;
        self.fetch.take_paused(request_id);
        debug!(%request_id, "Paused request continued");
        Ok(())
    }

    /// Fulfills a paused request with a synthetic response.
    ///
    /// A text body is base64-encoded for the wire; a pre-encoded body passes
    /// through unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::PausedRequestNotFound`] for an unknown id; no protocol
    ///   call is made
    pub async fn fulfill_request(
        &self,
        request_id: &RequestId,
        response_code: u16,
        headers: &[(String, String)],
        body: Option<&str>,
        body_is_base64: bool,
    ) -> Result<()> {
        self.require_paused_request(request_id)?;

        let mut params = json!({
            "requestId": request_id,
            "responseCode": response_code,
            "responseHeaders": header_entries(headers),
        });
        if let Some(body) = body {
            let encoded = if body_is_base64 {
                body.to_string()
            } else {
                Base64Standard.encode(body.as_bytes())
            };
            params["body"] = json!(encoded);
        }

        self.send("Fetch.fulfillRequest", Some(params)).await?;
        self.fetch.take_paused(request_id);
        debug!(%request_id, response_code, "Paused request fulfilled");
        Ok(())
    }

    /// Fails a paused request with a network error.
    ///
    /// # Errors
    ///
    /// - [`Error::PausedRequestNotFound`] for an unknown id; no protocol
    ///   call is made
    pub async fn fail_request(&self, request_id: &RequestId, error_reason: &str) -> Result<()> {
        self.require_paused_request(request_id)?;

        self.send(
            "Fetch.failRequest",
            Some(json!({
                "requestId": request_id,
                "errorReason": error_reason,
            })),
        )
        .await?;
        self.fetch.take_paused(request_id);
        debug!(%request_id, %error_reason, "Paused request failed");
        Ok(())
    }

    fn require_paused_request(&self, request_id: &RequestId) -> Result<()> {
        if self.fetch.get_paused(request_id).is_none() {
            return Err(Error::paused_request_not_found(request_id.clone()));
        }
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds the `[{name, value}]` header shape the Fetch domain expects.
fn header_entries(headers: &[(String, String)]) -> Value {
    Value::Array(
        headers
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::session::SessionConfig;
    use crate::state::RuleAction;

    fn spec(pattern: &str) -> RuleSpec {
        RuleSpec {
            pattern: pattern.to_string(),
            resource_types: Vec::new(),
            action: RuleAction::Mock,
            modify_headers: None,
            modify_url: None,
            mock_response: None,
            fail_reason: None,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_dispatch_on_unknown_id_makes_no_call() {
        // No transport is connected; reaching the wire would surface
        // NotConnected. PausedRequestNotFound proves the guard fired first.
        let session = Session::new(SessionConfig::default());
        let id = RequestId::new("interception-404");

        let err = session.continue_request(&id, None, None).await.unwrap_err();
        assert!(matches!(err, Error::PausedRequestNotFound { .. }));

        let err = session
            .fulfill_request(&id, 200, &[], None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PausedRequestNotFound { .. }));

        let err = session.fail_request(&id, "Failed").await.unwrap_err();
        assert!(matches!(err, Error::PausedRequestNotFound { .. }));
    }

    #[test]
    fn test_rule_management_roundtrip() {
        let session = Session::new(SessionConfig::default());

        let rule = session.add_intercept_rule(spec("*/api/*"));
        assert_eq!(rule.id, "rule-1");

        let fetched = session.get_intercept_rule(&rule.id).expect("present");
        assert_eq!(fetched.pattern, "*/api/*");

        session
            .set_intercept_rule_enabled(&rule.id, false)
            .expect("known id");
        assert!(!session.get_intercept_rule(&rule.id).unwrap().enabled);

        session.remove_intercept_rule(&rule.id).expect("known id");
        assert!(matches!(
            session.get_intercept_rule(&rule.id).unwrap_err(),
            Error::RuleNotFound { .. }
        ));
    }

    #[test]
    fn test_unknown_rule_operations() {
        let session = Session::new(SessionConfig::default());
        assert!(matches!(
            session.remove_intercept_rule("rule-9").unwrap_err(),
            Error::RuleNotFound { .. }
        ));
        assert!(matches!(
            session
                .set_intercept_rule_enabled("rule-9", true)
                .unwrap_err(),
            Error::RuleNotFound { .. }
        ));
    }

    #[test]
    fn test_header_entries_shape() {
        let entries = header_entries(&[("Content-Type".to_string(), "text/html".to_string())]);
        assert_eq!(entries[0]["name"], "Content-Type");
        assert_eq!(entries[0]["value"], "text/html");
    }
}
