use super::{McpSession, ProviderError, ToolProvider, ToolResult};
use crate::config::ServerConfig;
use crate::types::ToolDescriptor;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Opens a new channel for every operation and closes it straight after.
pub struct PerCallProvider {
    config: ServerConfig,
}

impl PerCallProvider {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ToolProvider for PerCallProvider {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        let mut session = McpSession::spawn(&self.config).await?;
        let tools = session.list_tools().await;
        session.close().await;
        tools
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ProviderError> {
        debug!(server = %self.config.name, tool = name, "Opening channel for single tool call");
        let mut session = McpSession::spawn(&self.config).await?;
        let result = session.call_tool(name, arguments).await;
        session.close().await;
        result
    }
}
