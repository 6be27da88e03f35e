//! Tool provider contract and its implementations.
//!
//! [`McpSession`] holds one stdio channel to an MCP tool server for as long as
//! the caller keeps it, [`PerCallProvider`] opens a fresh channel for every
//! operation and [`LocalProvider`] serves a toolset inside the current process.

mod local;
mod per_call;
mod result;
pub mod rpc;
mod session;

pub use local::LocalProvider;
pub use per_call::PerCallProvider;
pub use result::{ContentPart, ToolResult};
pub use session::{McpSession, PROTOCOL_VERSION};

use crate::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: io::Error,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' did not answer '{method}' within {timeout:?}")]
    Timeout {
        server: String,
        method: String,
        timeout: Duration,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' sent an invalid response: {reason}")]
    InvalidResponse { server: String, reason: String },
    #[error("tool server '{server}' closed the channel")]
    Closed { server: String },
    #[error("tool '{tool}' was rejected: {reason}")]
    Rejected { tool: String, reason: String },
}

#[async_trait]
pub trait ToolProvider: Send {
    /// The provider's current catalog, in the provider's own order.
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError>;

    async fn call_tool(&mut self, name: &str, arguments: Value)
    -> Result<ToolResult, ProviderError>;

    /// Release the underlying channel. Further calls fail with [`ProviderError::Closed`].
    async fn close(&mut self) {}
}
