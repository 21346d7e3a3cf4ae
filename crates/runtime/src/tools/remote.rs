//! Tools hosted by a remote MCP server.

use serde_json::Value;
use tracing::{debug, info};

use super::{ToolDescriptor, ToolResult};
use crate::{Error, Result};

/// Tool source backed by an initialized MCP session.
///
/// The tool list is fetched once, when the session is attached, and kept for
/// the lifetime of this value.
pub struct RemoteTools {
    client: mcp::Client,
    descriptors: Vec<ToolDescriptor>,
}

impl RemoteTools {
    /// Run the handshake on `client` and discover its tools.
    pub async fn connect(client: mcp::Client) -> Result<Self> {
        client.initialize().await?;
        let descriptors: Vec<ToolDescriptor> = client
            .list_tools()
            .await?
            .into_iter()
            .map(ToolDescriptor::from)
            .collect();

        info!(
            server = client.name(),
            tools = descriptors.len(),
            "discovered remote tools"
        );

        Ok(Self {
            client,
            descriptors,
        })
    }

    /// Spawn an MCP server process and attach to it.
    pub async fn spawn(config: mcp::ServerConfig) -> Result<Self> {
        let client = mcp::Client::spawn(config).await?;
        Self::connect(client).await
    }

    /// Descriptors discovered at connect time.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Call `name` on the server.
    ///
    /// Names that were not discovered fail with [`Error::UnknownTool`]
    /// without contacting the server.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolResult> {
        if !self.descriptors.iter().any(|d| d.name == name) {
            return Err(Error::UnknownTool(name.to_string()));
        }

        let result = self.client.call_tool(name, Some(arguments.clone())).await?;
        debug!(tool = name, is_error = result.is_error, "remote tool returned");
        Ok(result.into())
    }

    /// Release the session.
    pub async fn shutdown(self) -> Result<()> {
        self.client.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for RemoteTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.descriptors.iter().map(|d| d.name.as_str()).collect();
        f.debug_struct("RemoteTools")
            .field("server", &self.client.name())
            .field("tools", &names)
            .finish()
    }
}
