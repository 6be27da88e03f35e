use super::{BackendError, Completion, LmBackend};
use crate::catalog::FunctionSchema;
use crate::types::{Message, Role, ToolCallRequest};

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, info};

/// Chat completions through the OpenAI API (or any compatible endpoint).
pub struct OpenAiBackend {
    inner: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiBackend {
    /// The API key is read from `OPENAI_API_KEY`.
    pub fn new(model: impl Into<String>, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new();
        if let Some(api_base) = api_base {
            config = config.with_api_base(api_base);
        }
        Self {
            inner: Client::with_config(config),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LmBackend for OpenAiBackend {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[FunctionSchema]>,
    ) -> Result<Completion, BackendError> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(self.model.as_str())
            .messages(
                messages
                    .iter()
                    .map(ChatCompletionRequestMessage::from)
                    .collect::<Vec<_>>(),
            )
            .n(1);
        if let Some(tools) = tools.filter(|tools| !tools.is_empty()) {
            request
                .tools(tools.iter().map(ChatCompletionTool::from).collect::<Vec<_>>())
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }
        let request = request.build()?;

        info!(
            model = self.model.as_str(),
            messages = messages.len(),
            tools = tools.map_or(0, <[FunctionSchema]>::len),
            "Sending completion request"
        );
        let response = self.inner.chat().create(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(BackendError::EmptyResponse)?;
        debug!(finish_reason = ?choice.finish_reason, "Received completion");

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                tool_name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(Completion {
            text: choice.message.content,
            tool_calls,
        })
    }
}

impl From<&FunctionSchema> for ChatCompletionTool {
    fn from(value: &FunctionSchema) -> Self {
        Self {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: value.name.clone(),
                description: Some(value.description.clone()),
                parameters: Some(value.parameters.clone()),
                strict: None,
            },
        }
    }
}

impl From<&Message> for ChatCompletionRequestMessage {
    fn from(message: &Message) -> Self {
        let text = message.text().to_string();
        match message.role {
            Role::System => Self::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(text),
                name: None,
            }),
            Role::User => Self::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(text),
                name: None,
            }),
            Role::Assistant => Self::Assistant(ChatCompletionRequestAssistantMessage {
                content: if text.is_empty() {
                    None
                } else {
                    Some(ChatCompletionRequestAssistantMessageContent::Text(text))
                },
                tool_calls: if message.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        message
                            .tool_calls
                            .iter()
                            .map(|call| ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.tool_name.clone(),
                                    arguments: call.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
                ..Default::default()
            }),
            Role::Tool => Self::Tool(ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(text),
                tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
            }),
        }
    }
}
