//! Built-in arithmetic tools.

use serde::Deserialize;
use serde_json::json;

use super::{FnTool, LocalTools, ToolDescriptor, ToolError};
use crate::Result;

#[derive(Debug, Deserialize)]
struct AddArgs {
    a: i64,
    b: i64,
}

/// `add(a, b)`: sum of two integers.
pub fn add() -> FnTool {
    let descriptor = ToolDescriptor::new(
        "add",
        "Adds two integers together.",
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer", "description": "The first integer." },
                "b": { "type": "integer", "description": "The second integer." }
            },
            "required": ["a", "b"]
        }),
    );

    FnTool::new(descriptor, |AddArgs { a, b }| async move {
        a.checked_add(b)
            .ok_or_else(|| ToolError::Execution(format!("{a} + {b} overflows a 64-bit integer")))
    })
}

/// Registry holding every built-in tool.
pub fn registry() -> Result<LocalTools> {
    LocalTools::new().with(add())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn run(arguments: Value) -> crate::tools::ToolResult {
        registry().unwrap().invoke("add", &arguments).await.unwrap()
    }

    #[tokio::test]
    async fn adds_integers() {
        for (a, b, sum) in [(5, 3, 8), (-5, -3, -8), (5, -3, 2), (10, -10, 0), (0, 0, 0)] {
            let result = run(json!({ "a": a, "b": b })).await;
            assert!(!result.is_error);
            assert_eq!(result.content, sum.to_string());
        }
    }

    #[tokio::test]
    async fn missing_argument_is_tool_error() {
        let result = run(json!({ "a": 5 })).await;
        assert!(result.is_error);
        assert!(result.content.contains("missing field `b`"), "{}", result.content);
    }

    #[tokio::test]
    async fn wrong_type_is_tool_error() {
        let result = run(json!({ "a": "not_a_number", "b": 7 })).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn overflow_is_tool_error() {
        let result = run(json!({ "a": i64::MAX, "b": 1 })).await;
        assert!(result.is_error);
        assert!(result.content.contains("overflows"));
    }
}
