//! Tool descriptors and their function-calling schema.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Name, description and input schema of an invocable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

impl From<mcp::Tool> for ToolDescriptor {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

impl From<&ToolDescriptor> for mcp::Tool {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: Some(descriptor.description.clone()),
            input_schema: descriptor.input_schema.clone(),
        }
    }
}

/// A tool in the model's function-calling envelope.
///
/// Serializes as `{"type": "function", "function": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Convert a descriptor into the function-calling schema.
///
/// Name, description and schema are copied verbatim. The name must be
/// non-empty and the schema must be a JSON object of `"type": "object"`.
pub fn convert(descriptor: &ToolDescriptor) -> Result<FunctionSchema> {
    let invalid = |reason: &str| Error::InvalidSchema {
        tool: descriptor.name.clone(),
        reason: reason.to_string(),
    };

    if descriptor.name.trim().is_empty() {
        return Err(invalid("tool name is empty"));
    }

    let schema = descriptor
        .input_schema
        .as_object()
        .ok_or_else(|| invalid("input schema must be a JSON object"))?;

    match schema.get("type") {
        Some(Value::String(kind)) if kind == "object" => {}
        Some(_) => return Err(invalid("input schema type must be \"object\"")),
        None => return Err(invalid("input schema is missing \"type\"")),
    }

    if let Some(properties) = schema.get("properties") {
        if !properties.is_object() {
            return Err(invalid("input schema properties must be an object"));
        }
    }

    Ok(FunctionSchema {
        kind: "function".to_string(),
        function: FunctionDefinition {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: descriptor.input_schema.clone(),
        },
    })
}

/// Convert a set of descriptors offered together in one model call.
///
/// Fails on the first invalid descriptor or repeated name.
pub fn convert_all(descriptors: &[ToolDescriptor]) -> Result<Vec<FunctionSchema>> {
    let mut seen = HashSet::new();
    descriptors
        .iter()
        .map(|descriptor| {
            if !seen.insert(descriptor.name.as_str()) {
                return Err(Error::DuplicateTool(descriptor.name.clone()));
            }
            convert(descriptor)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn add() -> ToolDescriptor {
        ToolDescriptor::new(
            "add",
            "Adds two integers together.",
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" }
                },
                "required": ["a", "b"]
            }),
        )
    }

    #[test]
    fn conversion_is_deterministic() {
        let descriptor = add();
        assert_eq!(convert(&descriptor).unwrap(), convert(&descriptor).unwrap());
    }

    #[test]
    fn copies_fields_verbatim() {
        let descriptor = add();
        let schema = convert(&descriptor).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "add");
        assert_eq!(json["function"]["description"], "Adds two integers together.");
        assert_eq!(json["function"]["parameters"], descriptor.input_schema);
    }

    #[test]
    fn rejects_empty_name() {
        let mut descriptor = add();
        descriptor.name = "  ".into();
        assert!(matches!(convert(&descriptor), Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn rejects_non_object_schemas() {
        for schema in [
            json!("object"),
            json!({ "type": "array" }),
            json!({ "properties": {} }),
            json!({ "type": "object", "properties": [] }),
        ] {
            let descriptor = ToolDescriptor::new("bad", "", schema);
            assert!(
                matches!(convert(&descriptor), Err(Error::InvalidSchema { .. })),
                "accepted {:?}",
                descriptor.input_schema
            );
        }
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = convert_all(&[add(), add()]).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(name) if name == "add"));
    }

    #[test]
    fn mcp_tool_without_description() {
        let descriptor = ToolDescriptor::from(mcp::Tool {
            name: "ping".into(),
            description: None,
            input_schema: json!({ "type": "object" }),
        });
        assert_eq!(descriptor.description, "");
        assert!(convert(&descriptor).is_ok());
    }
}
