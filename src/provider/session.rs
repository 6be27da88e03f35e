use super::result::is_error_result;
use super::rpc::{METHOD_NOT_FOUND, RpcMessage, RpcRequest, RpcResponse};
use super::{ProviderError, ToolProvider, ToolResult};
use crate::config::ServerConfig;
use crate::types::ToolDescriptor;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, Lines,
};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2025-06-18";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One open MCP channel. Requests are strictly sequential: each one is
/// written and its response read before the next request may start.
pub struct McpSession {
    server: String,
    child: Option<Child>,
    writer: Option<BufWriter<BoxedWriter>>,
    lines: Lines<BufReader<BoxedReader>>,
    next_id: u64,
    timeout: Duration,
    instructions: Option<String>,
}

impl McpSession {
    /// Launch the configured server process and complete the MCP handshake.
    pub async fn spawn(config: &ServerConfig) -> Result<Self, ProviderError> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ProviderError::Spawn {
            server: config.name.clone(),
            source,
        })?;
        let transport_error = |message: &str| ProviderError::Transport {
            server: config.name.clone(),
            message: message.to_string(),
        };
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| transport_error("failed to capture server stdout"))?;
        info!(
            server = %config.name,
            command = %config.command,
            pid = ?child.id(),
            "Spawned tool server"
        );

        let mut session = Self::from_parts(
            config.name.clone(),
            Some(child),
            Box::new(stdout),
            Box::new(stdin),
            config.request_timeout,
        );
        session.handshake().await?;
        Ok(session)
    }

    /// Complete the MCP handshake over an already-connected byte stream pair.
    pub async fn connect<R, W>(
        server: impl Into<String>,
        reader: R,
        writer: W,
        timeout: Duration,
    ) -> Result<Self, ProviderError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let mut session = Self::from_parts(
            server.into(),
            None,
            Box::new(reader),
            Box::new(writer),
            timeout,
        );
        session.handshake().await?;
        Ok(session)
    }

    fn from_parts(
        server: String,
        child: Option<Child>,
        reader: BoxedReader,
        writer: BoxedWriter,
        timeout: Duration,
    ) -> Self {
        Self {
            server,
            child,
            writer: Some(BufWriter::new(writer)),
            lines: BufReader::new(reader).lines(),
            next_id: 1,
            timeout,
            instructions: None,
        }
    }

    /// Usage instructions the server sent during the handshake.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    async fn handshake(&mut self) -> Result<(), ProviderError> {
        match self.initialize().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.shutdown().await;
                Err(err)
            }
        }
    }

    async fn initialize(&mut self) -> Result<(), ProviderError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let result = self.request("initialize", params).await?;
        self.instructions = result
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_owned);
        debug!(
            server = %self.server,
            protocol = ?result.get("protocolVersion"),
            peer = ?result.get("serverInfo"),
            "MCP handshake accepted"
        );
        self.send(&RpcRequest::notification(
            "notifications/initialized",
            json!({}),
        ))
        .await
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&RpcRequest::call(id, method, params)).await?;

        let timeout = self.timeout;
        match tokio::time::timeout(timeout, self.read_response(id)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                server: self.server.clone(),
                method: method.to_string(),
                timeout,
            }),
        }
    }

    async fn read_response(&mut self, id: u64) -> Result<Value, ProviderError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|source| self.transport_error(source.to_string()))?
                .ok_or_else(|| ProviderError::Closed {
                    server: self.server.clone(),
                })?;
            if line.trim().is_empty() {
                continue;
            }

            let message = match serde_json::from_str::<RpcMessage>(&line) {
                Ok(message) => message,
                Err(source) => {
                    warn!(
                        server = %self.server,
                        line,
                        %source,
                        "Received invalid JSON from tool server"
                    );
                    continue;
                }
            };

            let method = message.method.clone();
            match (method.as_deref(), message.id.clone()) {
                (Some(method), Some(request_id)) => {
                    self.answer_server_request(request_id, method).await?;
                }
                (Some(method), None) => {
                    debug!(server = %self.server, method, "Received notification from tool server");
                }
                (None, Some(response_id)) if response_id.as_u64() == Some(id) => {
                    return self.response_result(message);
                }
                (None, other) => {
                    debug!(
                        server = %self.server,
                        response_id = ?other,
                        "Received response for unknown request"
                    );
                }
            }
        }
    }

    fn response_result(&self, message: RpcMessage) -> Result<Value, ProviderError> {
        match message.error {
            Some(error) => Err(ProviderError::Rpc {
                server: self.server.clone(),
                code: error.code,
                message: error.message,
            }),
            None => Ok(message.result.unwrap_or(Value::Null)),
        }
    }

    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<(), ProviderError> {
        let response = match method {
            "ping" => RpcResponse::success(id, json!({})),
            other => {
                warn!(server = %self.server, method = other, "Tool server sent unsupported request");
                RpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("client does not implement method '{other}'"),
                )
            }
        };
        self.send(&response).await
    }

    async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), ProviderError> {
        let mut encoded = serde_json::to_string(message).map_err(|source| {
            ProviderError::InvalidResponse {
                server: self.server.clone(),
                reason: source.to_string(),
            }
        })?;
        encoded.push('\n');

        let Some(writer) = self.writer.as_mut() else {
            return Err(ProviderError::Closed {
                server: self.server.clone(),
            });
        };
        let written = match writer.write_all(encoded.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(err) => Err(err),
        };
        written.map_err(|source| self.transport_error(source.to_string()))
    }

    fn transport_error(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::Transport {
            server: self.server.clone(),
            message: message.into(),
        }
    }

    /// Close stdin, give the server a moment to exit, then kill it.
    async fn shutdown(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.shutdown().await {
                debug!(server = %self.server, %err, "Failed to flush tool server stdin on close");
            }
        }

        let Some(mut child) = self.child.take() else {
            return;
        };
        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(server = %self.server, %status, "Tool server exited"),
            Ok(Err(err)) => warn!(server = %self.server, %err, "Failed to wait for tool server"),
            Err(_) => {
                warn!(server = %self.server, "Tool server did not exit in time, killing it");
                if let Err(err) = child.kill().await {
                    debug!(
                        server = %self.server,
                        %err,
                        "Failed to kill tool server process (may have already exited)"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ToolProvider for McpSession {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        let mut tools = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let mut result = self.request("tools/list", params).await?;
            let page = result.get_mut("tools").map(Value::take).ok_or_else(|| {
                ProviderError::InvalidResponse {
                    server: self.server.clone(),
                    reason: "tools/list result has no 'tools' array".to_string(),
                }
            })?;
            let page: Vec<ToolDescriptor> =
                serde_json::from_value(page).map_err(|source| ProviderError::InvalidResponse {
                    server: self.server.clone(),
                    reason: source.to_string(),
                })?;
            tools.extend(page);

            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_owned);
            if cursor.is_none() {
                break;
            }
        }
        debug!(server = %self.server, count = tools.len(), "Fetched tool catalog");
        Ok(tools)
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ProviderError> {
        let params = json!({
            "name": name,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        let result = self.request("tools/call", params).await?;
        if is_error_result(&result) {
            warn!(server = %self.server, tool = name, "Tool reported an error result");
        }
        Ok(ToolResult::from_call_result(result))
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}
