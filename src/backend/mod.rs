mod openai;

pub use openai::OpenAiBackend;

use crate::catalog::FunctionSchema;
use crate::types::{Message, ToolCallRequest};

use async_openai::error::OpenAIError;
use async_trait::async_trait;
use thiserror::Error;

/// One model reply: text, tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: vec![],
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("completion request failed: {0}")]
    OpenAi(#[from] OpenAIError),
    #[error("completion response contained no choices")]
    EmptyResponse,
}

#[async_trait]
pub trait LmBackend: Send + Sync {
    /// One completion round trip. `tools: None` sends no tool definitions.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[FunctionSchema]>,
    ) -> Result<Completion, BackendError>;
}
