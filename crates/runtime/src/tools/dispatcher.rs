//! Routes tool calls to local or remote tools.

use serde_json::Value;

use super::{LocalTools, RemoteTools, ToolDescriptor, ToolResult};
use crate::Result;

/// Where the agent's tools come from.
#[derive(Debug)]
pub enum Dispatcher {
    Local(LocalTools),
    Remote(RemoteTools),
}

impl Dispatcher {
    /// A dispatcher offering no tools.
    pub fn none() -> Self {
        Self::Local(LocalTools::new())
    }

    /// Descriptors of every tool this dispatcher can run.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        match self {
            Self::Local(tools) => tools.descriptors(),
            Self::Remote(tools) => tools.descriptors(),
        }
    }

    /// Run the tool `name` with `arguments`.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolResult> {
        match self {
            Self::Local(tools) => tools.invoke(name, arguments).await,
            Self::Remote(tools) => tools.invoke(name, arguments).await,
        }
    }

    /// Release any session held by the dispatcher.
    pub async fn shutdown(self) -> Result<()> {
        match self {
            Self::Local(_) => Ok(()),
            Self::Remote(tools) => tools.shutdown().await,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::none()
    }
}

impl From<LocalTools> for Dispatcher {
    fn from(tools: LocalTools) -> Self {
        Self::Local(tools)
    }
}

impl From<RemoteTools> for Dispatcher {
    fn from(tools: RemoteTools) -> Self {
        Self::Remote(tools)
    }
}
