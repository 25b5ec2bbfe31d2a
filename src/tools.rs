//! Tool result envelope for the outer shell.
//!
//! Every tool handler resolves to a [`ToolResult`]: text payloads carry JSON
//! stringified structured data, image payloads carry base64 data with a MIME
//! type, and errors carry `isError: true` plus a message beginning
//! `"Error: "`.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

// ============================================================================
// ToolContent
// ============================================================================

/// One content payload inside a tool result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text payload.
    Text {
        /// The text, usually JSON stringified structured data.
        text: String,
    },

    /// Inline image payload.
    Image {
        /// Base64-encoded image bytes.
        data: String,
        /// Image MIME type.
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

// ============================================================================
// ToolResult
// ============================================================================

/// The envelope a tool handler resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Content payloads, in order.
    pub content: Vec<ToolContent>,

    /// Set on failures.
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Builds a text result from already-rendered text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Builds a text result by JSON stringifying a value.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::text(text)
    }

    /// Builds an inline image result.
    #[must_use]
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Image {
                data: data.into(),
                mime_type: mime_type.into(),
            }],
            is_error: false,
        }
    }

    /// Builds an error result with the `"Error: "` message convention.
    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {message}"),
            }],
            is_error: true,
        }
    }
}

impl From<Error> for ToolResult {
    fn from(err: Error) -> Self {
        Self::error(err)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_text_result_serialization() {
        let result = ToolResult::json(&json!({ "count": 2 }));
        let encoded = serde_json::to_value(&result).expect("serialize");

        assert_eq!(encoded["content"][0]["type"], "text");
        assert!(
            encoded["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("\"count\": 2")
        );
        assert!(encoded.get("isError").is_none());
    }

    #[test]
    fn test_image_result_serialization() {
        let result = ToolResult::image("aGVsbG8=", "image/png");
        let encoded = serde_json::to_value(&result).expect("serialize");

        assert_eq!(encoded["content"][0]["type"], "image");
        assert_eq!(encoded["content"][0]["data"], "aGVsbG8=");
        assert_eq!(encoded["content"][0]["mimeType"], "image/png");
    }

    #[test]
    fn test_error_result_convention() {
        let result = ToolResult::from(Error::NotConnected);
        let encoded = serde_json::to_value(&result).expect("serialize");

        assert_eq!(encoded["isError"], true);
        assert!(
            encoded["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Error: ")
        );
    }
}
