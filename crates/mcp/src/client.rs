//! MCP client session (spawn or attach, handshake, requests, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, RequestId, Tool,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum output size (1MB).
/// Sized for large tool outputs (file reads, search results).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// How long a spawned server gets to exit after its stdin closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type Reader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Configuration for a server launched as a subprocess.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// A session with an MCP server.
///
/// Requests are serialized: one request is written and its response read
/// before the next request starts.
pub struct Client {
    name: String,
    process: Option<Child>,
    writer: Mutex<Writer>,
    reader: Mutex<Reader>,
    next_id: AtomicI64,
    server_info: Mutex<Option<InitializeResult>>,
    timeout: Duration,
}

impl Client {
    /// Spawn a server process and attach to its stdio.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(|source| Error::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdin = process.stdin.take().ok_or_else(|| Error::Spawn {
            command: config.command.clone(),
            source: std::io::Error::other("failed to capture stdin"),
        })?;

        let stdout = process.stdout.take().ok_or_else(|| Error::Spawn {
            command: config.command.clone(),
            source: std::io::Error::other("failed to capture stdout"),
        })?;

        debug!(server = %config.name, command = %config.command, "spawned MCP server");

        let mut client = Self::connect(config.name, stdout, stdin);
        client.process = Some(process);
        Ok(client)
    }

    /// Attach to a server over an existing byte stream.
    pub fn connect(
        name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        let writer: Writer = Box::new(writer);
        Self {
            name: name.into(),
            process: None,
            writer: Mutex::new(writer),
            reader: Mutex::new(BufReader::new(reader)),
            next_id: AtomicI64::new(1),
            server_info: Mutex::new(None),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Perform the initialize handshake.
    ///
    /// Only the first call talks to the server; later calls return the
    /// cached result.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let mut server_info = self.server_info.lock().await;
        if let Some(info) = server_info.as_ref() {
            return Ok(info.clone());
        }

        let result: InitializeResult = self
            .request("initialize", Some(InitializeParams::default()))
            .await?;
        self.notify("notifications/initialized", None::<()>).await?;

        debug!(
            server = %self.name,
            remote = %result.server_info.name,
            protocol = %result.protocol_version,
            "MCP session initialized"
        );

        *server_info = Some(result.clone());
        Ok(result)
    }

    /// Check if the handshake has completed.
    pub async fn is_initialized(&self) -> bool {
        self.server_info.lock().await.is_some()
    }

    /// Ask the server for its tools.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized().await?;
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        Ok(result.tools)
    }

    /// Call a tool by name.
    ///
    /// A result with `is_error` set is returned as data, not as an `Err`.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        self.ensure_initialized().await?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        self.request("tools/call", Some(params)).await
    }

    /// End the session.
    ///
    /// Closes the server's input, gives a spawned server a moment to exit on
    /// its own, then kills it.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            name,
            process,
            writer,
            ..
        } = self;

        drop(writer);

        if let Some(mut process) = process {
            if timeout(SHUTDOWN_GRACE, process.wait()).await.is_err() {
                process.kill().await?;
            }
        }

        debug!(server = %name, "MCP session closed");
        Ok(())
    }

    // --- Internal methods ---

    async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        // Hold the reader for the whole exchange so responses can't interleave
        let mut reader = self.reader.lock().await;

        trace!(server = %self.name, method, ?id, "sending request");
        self.write_line(&serde_json::to_string(&request)?).await?;

        let response = timeout(self.timeout, read_response(&mut reader, &self.name, &id))
            .await
            .map_err(|_| Error::Timeout)??;

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        // Notifications have no ID
        let mut notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        if let Some(p) = params {
            notification["params"] = serde_json::to_value(p)?;
        }

        self.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn write_line(&self, json: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

async fn read_response(reader: &mut Reader, server: &str, id: &RequestId) -> Result<JsonRpcResponse> {
    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Err(Error::ServerExited);
        }

        if line.len() > MAX_OUTPUT_SIZE {
            return Err(Error::OutputTooLarge {
                size: line.len(),
                max: MAX_OUTPUT_SIZE,
            });
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message: Value = serde_json::from_str(line)?;

        // Server-initiated notifications and requests carry a method
        if message.get("method").is_some() || message.get("id").is_none() {
            trace!(server, "skipping server-initiated message");
            continue;
        }

        let response: JsonRpcResponse = serde_json::from_value(message)?;

        // Late answers to requests that already timed out
        if let (RequestId::Number(got), RequestId::Number(expected)) = (&response.id, id) {
            if got < expected {
                trace!(server, id = got, "skipping response to abandoned request");
                continue;
            }
        }

        if &response.id != id {
            return Err(Error::InvalidResponse(format!(
                "response ID mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        return Ok(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex, split};

    /// Client wired to the test's end of an in-memory pipe.
    fn pipe() -> (Client, tokio::io::DuplexStream) {
        let (client_end, server_end) = duplex(64 * 1024);
        let (reader, writer) = split(client_end);
        (Client::connect("test", reader, writer), server_end)
    }

    #[test]
    fn server_config_creation() {
        let config = ServerConfig {
            name: "math".to_string(),
            command: "math-mcp".to_string(),
            args: vec![],
            env: HashMap::new(),
        };
        assert_eq!(config.name, "math");
    }

    #[tokio::test]
    async fn tools_require_handshake() {
        let (client, _server) = pipe();
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, Error::NotInitialized));

        let err = client.call_tool("add", None).await.unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
    }

    #[tokio::test]
    async fn server_exit_is_reported() {
        let (client, server) = pipe();
        drop(server);
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, Error::ServerExited | Error::Io(_)));
    }

    #[tokio::test]
    async fn skips_notifications_and_rejects_mismatched_ids() {
        let (client, server) = pipe();
        let (server_read, mut server_write) = split(server);

        let responder = tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            // initialize request
            lines.next_line().await.unwrap().unwrap();
            server_write
                .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{}}\n")
                .await
                .unwrap();
            server_write
                .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":99,\"result\":{}}\n")
                .await
                .unwrap();
            server_write.flush().await.unwrap();
        });

        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn request_times_out() {
        let (client, _server) = pipe();
        let client = client.with_timeout(Duration::from_millis(20));
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }
}
