//! Server side of the protocol: answers requests from a [`ToolProvider`].

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, Implementation,
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcResponse,
    ListToolsResult, METHOD_NOT_FOUND, PROTOCOL_VERSION, ServerCapabilities, Tool,
    ToolsCapability,
};

/// Something that can list and run tools on behalf of remote clients.
pub trait ToolProvider: Send + Sync {
    /// Tools advertised through `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Run a tool. Failures are reported through `is_error`.
    fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = CallToolResult> + Send;
}

/// Serve `provider` until `reader` reaches EOF.
pub async fn serve<P, R, W>(provider: &P, info: Implementation, reader: R, mut writer: W) -> Result<()>
where
    P: ToolProvider,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: JsonRpcMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "skipping malformed message");
                continue;
            }
        };

        let Some(id) = message.id else {
            debug!(method = %message.method, "notification");
            continue;
        };

        let response = match handle(provider, &info, &message.method, message.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => {
                debug!(method = %message.method, %error, "request failed");
                JsonRpcResponse::failure(id, error)
            }
        };

        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    debug!(server = %info.name, "client disconnected");
    Ok(())
}

async fn handle<P: ToolProvider>(
    provider: &P,
    info: &Implementation,
    method: &str,
    params: Option<Value>,
) -> std::result::Result<Value, JsonRpcError> {
    match method {
        "initialize" => {
            let params: InitializeParams = parse_params(params)?;
            debug!(client = %params.client_info.name, "initialize");
            to_result(InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities {
                    tools: Some(ToolsCapability::default()),
                },
                server_info: info.clone(),
            })
        }
        "ping" => Ok(Value::Object(Default::default())),
        "tools/list" => to_result(ListToolsResult {
            tools: provider.tools(),
        }),
        "tools/call" => {
            let params: CallToolParams = parse_params(params)?;
            debug!(tool = %params.name, "tools/call");
            to_result(provider.call_tool(&params.name, params.arguments).await)
        }
        other => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("method not found: {other}"),
        )),
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, e.to_string()))
}

fn to_result(value: impl Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}
