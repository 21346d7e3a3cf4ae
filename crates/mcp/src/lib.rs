//! MCP (Model Context Protocol) client and server over newline-delimited
//! JSON-RPC.
//!
//! The client side talks to a tool-hosting server either as a spawned
//! subprocess or over any async byte stream. The server side exposes a
//! [`ToolProvider`] through the same protocol.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, ServerConfig};
//! use std::collections::HashMap;
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig {
//!     name: "math".to_string(),
//!     command: "math-mcp".to_string(),
//!     args: vec![],
//!     env: HashMap::new(),
//! };
//!
//! let client = Client::spawn(config).await?;
//! client.initialize().await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = client
//!     .call_tool("add", Some(serde_json::json!({ "a": 15, "b": 7 })))
//!     .await?;
//! println!("{}", result.joined_text());
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;
mod server;

pub use client::{Client, DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, ServerConfig};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, Implementation, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    PROTOCOL_VERSION, RequestId, ServerCapabilities, Tool, ToolContent,
};
pub use server::{ToolProvider, serve};
