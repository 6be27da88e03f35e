use super::{ProviderError, ToolProvider, ToolResult};
use crate::types::{AsyncToolSet, ToolDescriptor};

use async_trait::async_trait;
use serde_json::Value;

/// Serves an async toolset from inside the calling process.
pub struct LocalProvider<C> {
    toolset: AsyncToolSet<C>,
    context: C,
}

impl<C> LocalProvider<C> {
    pub fn new(toolset: AsyncToolSet<C>, context: C) -> Self {
        Self { toolset, context }
    }
}

#[async_trait]
impl<C> ToolProvider for LocalProvider<C>
where
    C: Clone + Send + Sync + 'static,
{
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(self.toolset.descriptors())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ProviderError> {
        let json = arguments.to_string();
        match self
            .toolset
            .try_tool_call(self.context.clone(), name, &json)
            .await
        {
            Ok(Ok(text)) => Ok(ToolResult::Text(text)),
            Ok(Err(err)) => Ok(ToolResult::Text(format!("Error: {err:#}"))),
            Err(err) => Err(ProviderError::Rejected {
                tool: name.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}
