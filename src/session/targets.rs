//! Target listing and switching over the HTTP endpoint.
//!
//! The HTTP base outlives any one WebSocket connection, so target listings
//! keep working after a switch.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::identifiers::TargetId;

use super::core::Session;

// ============================================================================
// TargetInfo
// ============================================================================

/// One entry from `GET {httpBase}/json/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    /// Target identifier.
    pub id: TargetId,

    /// Target kind (`page`, `iframe`, `service_worker`, …).
    #[serde(rename = "type", default)]
    pub target_type: String,

    /// Page title.
    #[serde(default)]
    pub title: String,

    /// Target URL.
    #[serde(default)]
    pub url: String,

    /// Per-target WebSocket endpoint.
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_debugger_url: Option<String>,
}

// ============================================================================
// VersionInfo
// ============================================================================

/// Payload of `GET {httpBase}/json/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Browser product and version.
    #[serde(rename = "Browser", default)]
    pub browser: String,

    /// DevTools protocol version.
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,

    /// Browser-level WebSocket endpoint.
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub ws_debugger_url: Option<String>,
}

// ============================================================================
// Session - Targets
// ============================================================================

impl Session {
    /// Lists debuggable targets from the HTTP endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] when no HTTP base is known
    pub async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
        let base = self.http_base().ok_or(Error::NotConnected)?;
        let client = self.http_client()?;

        let targets = client
            .get(format!("{base}/json/list"))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<TargetInfo>>()
            .await?;

        Ok(targets)
    }

    /// Fetches browser and protocol version information.
    pub async fn browser_version(&self) -> Result<VersionInfo> {
        let base = self.http_base().ok_or(Error::NotConnected)?;
        let client = self.http_client()?;

        let version = client
            .get(format!("{base}/json/version"))
            .send()
            .await?
            .error_for_status()?
            .json::<VersionInfo>()
            .await?;

        Ok(version)
    }

    /// Switches the session to another page target.
    ///
    /// The current connection is torn down and replaced; projections keep
    /// their state, and the HTTP base survives for further listings.
    ///
    /// # Errors
    ///
    /// - [`Error::TargetNotFound`] for an unknown id or a target without a
    ///   debugger endpoint
    pub async fn switch_target(&self, target_id: &TargetId) -> Result<()> {
        let targets = self.list_targets().await?;

        let target = targets
            .into_iter()
            .find(|t| &t.id == target_id)
            .ok_or_else(|| Error::target_not_found(target_id.clone()))?;

        let ws_url = target
            .ws_debugger_url
            .ok_or_else(|| Error::target_not_found(target_id.clone()))?;

        info!(target_id = %target_id, url = %target.url, "Switching target");
        self.connect(&ws_url).await
    }

    /// Connects to the first page target of an HTTP endpoint.
    ///
    /// Records the base so listings keep working afterwards.
    pub async fn connect_to_endpoint(&self, http_base: &str) -> Result<()> {
        self.set_http_base(http_base.trim_end_matches('/'));

        let targets = self.list_targets().await?;
        let ws_url = targets
            .into_iter()
            .filter(|t| t.target_type == "page")
            .find_map(|t| t.ws_debugger_url)
            .ok_or_else(|| Error::config("endpoint exposes no debuggable page target"))?;

        self.connect(&ws_url).await
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(self.config.timeout)
            .build()?)
    }
}

// ============================================================================
// Tests
// ============================================================================
