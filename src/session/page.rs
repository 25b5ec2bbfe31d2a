//! Navigation, screenshots, and page snapshots.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};

use super::core::Session;
use super::eval::BreakpointAware;

// ============================================================================
// Constants
// ============================================================================

/// Captures up to this size return inline; larger ones go to a temp file.
const INLINE_CAPTURE_LIMIT: usize = 1024 * 1024;

// ============================================================================
// CaptureOutcome
// ============================================================================

/// Result of a screenshot or snapshot capture.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// Payload small enough to return inline.
    Inline {
        /// Capture payload: base64 for images, raw text for MHTML.
        data: String,
        /// MIME type of the payload.
        mime_type: String,
        /// Decoded payload size in bytes.
        byte_size: usize,
    },

    /// Payload written to a temp file.
    Saved {
        /// Capture format (`png`, `jpeg`, `mhtml`, …).
        format: String,
        /// Payload size in bytes.
        byte_size: usize,
        /// Where the payload was written.
        saved_to: PathBuf,
    },
}

impl CaptureOutcome {
    /// Renders the tool-level result shape for the saved case; inline
    /// captures become content payloads instead.
    #[must_use]
    pub fn to_tool_json(&self) -> Value {
        match self {
            Self::Inline {
                mime_type,
                byte_size,
                ..
            } => json!({ "inline": true, "mimeType": mime_type, "byteSize": byte_size }),
            Self::Saved {
                format,
                byte_size,
                saved_to,
            } => json!({ "format": format, "byteSize": byte_size, "savedTo": saved_to }),
        }
    }
}

// ============================================================================
// Session - Page
// ============================================================================

impl Session {
    /// Enables the page domain.
    pub async fn enable_page(&self) -> Result<()> {
        self.send("Page.enable", None).await.map(|_| ())
    }

    /// Navigates the page, watching for a pause the load may trigger.
    pub async fn navigate(&self, url: &str) -> Result<BreakpointAware<Value>> {
        debug!(%url, "Navigating");
        self.send_with_breakpoint_detection("Page.navigate", Some(json!({ "url": url })))
            .await
    }

    /// Captures a screenshot.
    ///
    /// Results up to 1 MiB return inline; larger ones are written to
    /// `${TMPDIR}/screenshot-{epochMs}.{format}`.
    pub async fn capture_screenshot(
        &self,
        format: &str,
        quality: Option<u8>,
    ) -> Result<CaptureOutcome> {
        let mut params = json!({ "format": format });
        if let Some(quality) = quality {
            params["quality"] = json!(quality);
        }

        let result = self.send("Page.captureScreenshot", Some(params)).await?;
        let data = result
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let bytes = Base64Standard
            .decode(data)
            .map_err(|e| Error::decode(format!("screenshot payload: {e}")))?;

        if bytes.len() <= INLINE_CAPTURE_LIMIT {
            return Ok(CaptureOutcome::Inline {
                data: data.to_string(),
                mime_type: format!("image/{format}"),
                byte_size: bytes.len(),
            });
        }

        let path = temp_capture_path("screenshot", format);
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Screenshot saved");

        Ok(CaptureOutcome::Saved {
            format: format.to_string(),
            byte_size: bytes.len(),
            saved_to: path,
        })
    }

    /// Captures an MHTML snapshot of the page.
    ///
    /// Same inline/save threshold as screenshots; saved files land at
    /// `${TMPDIR}/snapshot-{epochMs}.mhtml`.
    pub async fn capture_snapshot(&self) -> Result<CaptureOutcome> {
        let result = self
            .send("Page.captureSnapshot", Some(json!({ "format": "mhtml" })))
            .await?;
        let data = result
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if data.len() <= INLINE_CAPTURE_LIMIT {
            return Ok(CaptureOutcome::Inline {
                data: data.to_string(),
                mime_type: "multipart/related".to_string(),
                byte_size: data.len(),
            });
        }

        let path = temp_capture_path("snapshot", "mhtml");
        tokio::fs::write(&path, data.as_bytes()).await?;
        debug!(path = %path.display(), bytes = data.len(), "Snapshot saved");

        Ok(CaptureOutcome::Saved {
            format: "mhtml".to_string(),
            byte_size: data.len(),
            saved_to: path,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds `${TMPDIR}/{prefix}-{epochMs}.{extension}`.
fn temp_capture_path(prefix: &str, extension: &str) -> PathBuf {
    let epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("{prefix}-{epoch_ms}.{extension}"))
}

// ============================================================================
// Tests
// ============================================================================
