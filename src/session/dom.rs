//! Document node cache and selector queries.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::core::Session;

// ============================================================================
// Session - DOM
// ============================================================================

impl Session {
    /// Returns the root document node id, fetching it on first use.
    ///
    /// The cached id is invalidated by `DOM.documentUpdated`; the next call
    /// re-fetches.
    pub async fn document_node_id(&self) -> Result<i64> {
        if let Some(node_id) = self.document.get() {
            return Ok(node_id);
        }

        let result = self
            .send("DOM.getDocument", Some(json!({ "depth": 0 })))
            .await?;

        let node_id = result
            .get("root")
            .and_then(|root| root.get("nodeId"))
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::decode("getDocument response missing root.nodeId"))?;

        self.document.set(node_id);
        Ok(node_id)
    }

    /// Finds the first element matching a CSS selector.
    ///
    /// Returns `None` when nothing matches (Chrome reports node id 0).
    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>> {
        let document = self.document_node_id().await?;

        let result = self
            .send(
                "DOM.querySelector",
                Some(json!({ "nodeId": document, "selector": selector })),
            )
            .await?;

        let node_id = result
            .get("nodeId")
            .and_then(Value::as_i64)
            .unwrap_or_default();

        Ok((node_id != 0).then_some(node_id))
    }
}
