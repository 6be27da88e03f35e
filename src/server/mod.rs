//! Minimal MCP tool server: newline-delimited JSON-RPC over any byte stream pair.

use crate::provider::PROTOCOL_VERSION;
use crate::provider::rpc::{
    INVALID_PARAMS, INVALID_REQUEST, PARSE_ERROR, RpcMessage, RpcResponse,
};
use crate::types::{AsyncToolSet, ToolCallError};

use serde_json::{Value, json};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct ToolServer<C> {
    name: String,
    version: String,
    instructions: Option<String>,
    toolset: AsyncToolSet<C>,
    context: C,
}

impl<C> ToolServer<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn new(toolset: AsyncToolSet<C>, context: C) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
            toolset,
            context,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Answer requests until the reader reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        let mut writer = writer;
        info!(server = %self.name, tools = self.toolset.len(), "Serving tools");

        while let Some(line) = lines.next_line().await.map_err(ServerError::Read)? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let mut encoded = serde_json::to_string(&response)?;
            encoded.push('\n');
            writer
                .write_all(encoded.as_bytes())
                .await
                .map_err(ServerError::Write)?;
            writer.flush().await.map_err(ServerError::Write)?;
        }

        info!(server = %self.name, "Client closed the channel");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "Received unparseable request");
                return Some(RpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {err}"),
                ));
            }
        };
        let id = value.get("id").cloned();
        let message = match serde_json::from_value::<RpcMessage>(value) {
            Ok(message) => message,
            Err(err) => {
                return Some(RpcResponse::error(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("invalid request: {err}"),
                ));
            }
        };
        self.handle(message).await
    }

    async fn handle(&self, message: RpcMessage) -> Option<RpcResponse> {
        let RpcMessage {
            jsonrpc,
            id,
            method,
            params,
            ..
        } = message;

        let Some(method) = method else {
            if id.is_some() {
                debug!(?id, "Ignoring response sent to the server");
                return None;
            }
            return Some(RpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "message has neither a method nor an id",
            ));
        };

        let Some(id) = id else {
            debug!(method = %method, "Received notification");
            return None;
        };

        if jsonrpc.as_deref() != Some("2.0") {
            return Some(RpcResponse::error(
                id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        debug!(method = %method, %id, "Handling request");
        let params = params.unwrap_or_else(|| json!({}));
        let response = match method.as_str() {
            "initialize" => RpcResponse::success(id, self.initialize_result(&params)),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, json!({ "tools": self.toolset.descriptors() })),
            "tools/call" => match self.call_tool(params).await {
                Ok(result) => RpcResponse::success(id, result),
                Err(message) => RpcResponse::error(id, INVALID_PARAMS, message),
            },
            other => RpcResponse::method_not_found(id, other),
        };
        Some(response)
    }

    fn initialize_result(&self, params: &Value) -> Value {
        let protocol = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        let mut result = json!({
            "protocolVersion": protocol,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version },
        });
        if let Some(instructions) = &self.instructions {
            result["instructions"] = json!(instructions);
        }
        result
    }

    /// Protocol-level problems are `Err`; tool failures are `isError` results.
    async fn call_tool(&self, params: Value) -> Result<Value, String> {
        let Value::Object(mut params) = params else {
            return Err("tools/call params must be an object".to_string());
        };
        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err("tools/call requires a string 'name'".to_string()),
        };
        let arguments = match params.remove("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(arguments @ Value::Object(_)) => arguments,
            Some(_) => return Err("tools/call 'arguments' must be an object".to_string()),
        };

        let outcome = self
            .toolset
            .try_tool_call(self.context.clone(), &name, &arguments.to_string())
            .await;
        let (text, is_error) = match outcome {
            Ok(Ok(text)) => (text, false),
            Ok(Err(err)) => (format!("Error: {err:#}"), true),
            Err(ToolCallError::NotFound(tool)) => (format!("Unknown tool: {tool}"), true),
            Err(err @ ToolCallError::Deserialization(_)) => {
                (format!("Invalid arguments for tool '{name}': {err}"), true)
            }
        };
        if is_error {
            warn!(tool = %name, "Tool call failed");
        } else {
            info!(tool = %name, "Tool call succeeded");
        }
        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "isError": is_error,
        }))
    }
}

pub async fn serve<C, R, W>(
    toolset: AsyncToolSet<C>,
    context: C,
    reader: R,
    writer: W,
) -> Result<(), ServerError>
where
    C: Clone + Send + Sync + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    ToolServer::new(toolset, context).serve(reader, writer).await
}
