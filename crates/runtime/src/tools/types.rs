//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The normalized outcome of a tool call, as shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// A successful result rendering a tool's return value.
    ///
    /// Strings are used as-is; anything else is rendered as compact JSON.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::success(text.clone()),
            other => Self::success(other.to_string()),
        }
    }
}

impl From<mcp::CallToolResult> for ToolResult {
    fn from(result: mcp::CallToolResult) -> Self {
        Self {
            content: result.joined_text(),
            is_error: result.is_error,
        }
    }
}

impl From<ToolResult> for mcp::CallToolResult {
    fn from(result: ToolResult) -> Self {
        if result.is_error {
            Self::error(result.content)
        } else {
            Self::text(result.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_values() {
        assert_eq!(ToolResult::from_value(&json!(22)).content, "22");
        assert_eq!(ToolResult::from_value(&json!("plain")).content, "plain");
        assert_eq!(ToolResult::from_value(&json!({"x": 1})).content, r#"{"x":1}"#);
    }

    #[test]
    fn converts_mcp_results_both_ways() {
        let result = ToolResult::error("boom");
        let wire: mcp::CallToolResult = result.clone().into();
        assert!(wire.is_error);
        assert_eq!(ToolResult::from(wire), result);
    }
}
