//! Network request queries and response bodies.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::state::NetworkRequest;

use super::core::Session;

// ============================================================================
// Session - Network
// ============================================================================

impl Session {
    /// Enables the network domain.
    pub async fn enable_network(&self) -> Result<()> {
        self.send("Network.enable", None).await?;
        self.network.set_enabled(true);
        Ok(())
    }

    /// Disables the network domain and clears the request table.
    pub async fn disable_network(&self) -> Result<()> {
        self.send("Network.disable", None).await?;
        self.network.set_enabled(false);
        Ok(())
    }

    /// Returns all tracked requests in insertion order.
    #[must_use]
    pub fn list_requests(&self) -> Vec<NetworkRequest> {
        self.network.get_all()
    }

    /// Returns requests whose URL matches the pattern (substring semantics).
    #[must_use]
    pub fn requests_by_url(&self, pattern: &str) -> Vec<NetworkRequest> {
        self.network.get_by_url(pattern)
    }

    /// Returns requests of the given resource type.
    #[must_use]
    pub fn requests_by_type(&self, resource_type: &str) -> Vec<NetworkRequest> {
        self.network.get_by_type(resource_type)
    }

    /// Returns failed requests.
    #[must_use]
    pub fn failed_requests(&self) -> Vec<NetworkRequest> {
        self.network.get_failed()
    }

    /// Returns requests still in flight.
    #[must_use]
    pub fn pending_requests(&self) -> Vec<NetworkRequest> {
        self.network.get_pending()
    }

    /// Returns phase counts for tool output.
    #[must_use]
    pub fn request_summary(&self) -> Value {
        self.network.get_summary()
    }

    /// Clears the request table.
    pub fn clear_requests(&self) {
        self.network.clear();
    }

    /// Renders the `list_requests` tool result shape.
    #[must_use]
    pub fn list_requests_json(&self) -> Value {
        let requests: Vec<Value> = self
            .network
            .get_all()
            .iter()
            .map(request_row)
            .collect();

        json!({
            "count": requests.len(),
            "requests": requests,
        })
    }

    /// Fetches the response body for a completed request.
    ///
    /// Base64-encoded bodies are decoded before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::ResponseBodyUnavailable`] when Chrome no longer holds the
    ///   body (evicted, redirected, or never buffered)
    pub async fn get_response_body(&self, request_id: &RequestId) -> Result<String> {
        let result = self
            .send(
                "Network.getResponseBody",
                Some(json!({ "requestId": request_id })),
            )
            .await
            .map_err(|err| match err {
                Error::Protocol { .. } => Error::response_body_unavailable(request_id.clone()),
                other => other,
            })?;

        let body = result
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if result
            .get("base64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            let bytes = Base64Standard
                .decode(body)
                .map_err(|e| Error::decode(format!("response body base64: {e}")))?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok(body.to_string())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// One row of the `list_requests` tool result.
fn request_row(request: &NetworkRequest) -> Value {
    let duration = match request.duration() {
        Some(seconds) => json!((seconds * 1000.0).round()),
        None => json!("pending"),
    };

    let mut row = json!({
        "requestId": request.request_id,
        "url": request.url,
        "method": request.method,
        "resourceType": request.resource_type,
        "status": request.status,
        "duration": duration,
        "size": request.encoded_data_length,
        "failed": request.failed,
    });
    if let Some(error_text) = &request.error_text {
        row["errorText"] = json!(error_text);
    }
    row
}

// ============================================================================
// Tests
// ============================================================================
