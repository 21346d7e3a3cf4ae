//! In-process tool registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::{Tool, ToolDescriptor, ToolError, ToolResult, convert};
use crate::{Error, Result};

/// Tools registered by name and run in-process.
#[derive(Clone, Default)]
pub struct LocalTools {
    tools: HashMap<String, Arc<dyn Tool>>,
    descriptors: Vec<ToolDescriptor>,
}

impl LocalTools {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// The descriptor is validated up front; names must be unique.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<()> {
        let descriptor = tool.descriptor().clone();
        convert(&descriptor)?;
        if self.tools.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }

        self.tools.insert(descriptor.name.clone(), Arc::new(tool));
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Builder form of [`LocalTools::register`].
    pub fn with(mut self, tool: impl Tool + 'static) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the tool `name`.
    ///
    /// An unregistered name is an [`Error::UnknownTool`]. Everything that goes
    /// wrong inside the tool, including arguments that are not an object,
    /// comes back as an error [`ToolResult`].
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let arguments = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let err = ToolError::InvalidInput(format!(
                    "arguments must be a JSON object, got {other}"
                ));
                return Ok(ToolResult::error(err.to_string()));
            }
        };

        match tool.call(arguments).await {
            Ok(output) => Ok(ToolResult::from_value(&output)),
            Err(e) => {
                debug!(tool = name, error = %e, "local tool failed");
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}

impl mcp::ToolProvider for LocalTools {
    fn tools(&self) -> Vec<mcp::Tool> {
        self.descriptors.iter().map(mcp::Tool::from).collect()
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> mcp::CallToolResult {
        let arguments = arguments.unwrap_or(Value::Null);
        match self.invoke(name, &arguments).await {
            Ok(result) => result.into(),
            Err(e) => mcp::CallToolResult::error(e.to_string()),
        }
    }
}

impl std::fmt::Debug for LocalTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.descriptors.iter().map(|d| d.name.as_str()).collect();
        f.debug_struct("LocalTools").field("tools", &names).finish()
    }
}
