//! The per-turn state machine.
//!
//! A turn fetches the tool catalog, appends the user message, asks the model
//! once, and if the model asked for tools, dispatches every call in request
//! order before asking the model a second time without tool definitions.
//! Only a failed catalog fetch or a failed completion ends a turn early;
//! anything that goes wrong inside a tool call becomes that call's result text.

use crate::backend::{BackendError, Completion, LmBackend};
use crate::catalog::{self, FunctionSchema};
use crate::normalize::normalize_text;
use crate::provider::{ProviderError, ToolProvider};
use crate::types::{ConversationHistory, Message, ToolCallRequest};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("tool provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),
    #[error("language model request failed: {0}")]
    Backend(#[source] BackendError),
}

#[derive(Debug, Error)]
pub enum ToolArgumentError {
    #[error("arguments are not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Calls dispatched this turn, in dispatch order.
    pub tool_calls: Vec<ToolCallRequest>,
    /// Calls the model asked for in its final reply; these are never dispatched.
    pub ignored_tool_calls: usize,
}

#[derive(Debug)]
enum TurnState {
    AwaitingInput,
    FetchingCatalog,
    RequestingCompletion { catalog: Vec<FunctionSchema> },
    DispatchingTools { calls: Vec<ToolCallRequest> },
    RequestingFinalCompletion { calls: Vec<ToolCallRequest> },
    Done(TurnOutcome),
}

impl TurnState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInput => "awaiting_input",
            Self::FetchingCatalog => "fetching_catalog",
            Self::RequestingCompletion { .. } => "requesting_completion",
            Self::DispatchingTools { .. } => "dispatching_tools",
            Self::RequestingFinalCompletion { .. } => "requesting_final_completion",
            Self::Done(_) => "done",
        }
    }
}

pub struct Orchestrator<B> {
    backend: B,
}

impl<B: LmBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Run one user turn against `history`, dispatching tool calls through `provider`.
    ///
    /// Not idempotent: the history grows and tools may have side effects even
    /// when a later step fails.
    pub async fn handle_turn(
        &self,
        user_text: &str,
        history: &mut ConversationHistory,
        provider: &mut dyn ToolProvider,
    ) -> Result<TurnOutcome, TurnError> {
        let mut state = TurnState::AwaitingInput;
        loop {
            let next = match state {
                TurnState::AwaitingInput => TurnState::FetchingCatalog,
                TurnState::FetchingCatalog => {
                    let catalog = catalog::fetch_catalog(provider)
                        .await
                        .map_err(TurnError::ProviderUnavailable)?;
                    history.push(Message::user(user_text));
                    TurnState::RequestingCompletion { catalog }
                }
                TurnState::RequestingCompletion { catalog } => {
                    let tools = (!catalog.is_empty()).then_some(catalog.as_slice());
                    let completion = self
                        .backend
                        .complete(history.messages(), tools)
                        .await
                        .map_err(TurnError::Backend)?;
                    Self::record_first_reply(completion, history)
                }
                TurnState::DispatchingTools { calls } => {
                    for (index, call) in calls.iter().enumerate() {
                        info!(
                            tool = call.tool_name.as_str(),
                            call_id = call.id.as_str(),
                            position = index + 1,
                            total = calls.len(),
                            "Dispatching tool call"
                        );
                        let content = dispatch(call, provider).await;
                        history.push(Message::tool(call.id.clone(), content));
                    }
                    TurnState::RequestingFinalCompletion { calls }
                }
                TurnState::RequestingFinalCompletion { calls } => {
                    let completion = self
                        .backend
                        .complete(history.messages(), None)
                        .await
                        .map_err(TurnError::Backend)?;
                    let ignored_tool_calls = completion.tool_calls.len();
                    if ignored_tool_calls > 0 {
                        warn!(
                            count = ignored_tool_calls,
                            tools = ?completion
                                .tool_calls
                                .iter()
                                .map(|call| call.tool_name.as_str())
                                .collect::<Vec<_>>(),
                            "Ignoring tool calls requested after the dispatch round"
                        );
                    }
                    let reply = completion.text.unwrap_or_default();
                    history.push(Message::assistant(reply.clone()));
                    TurnState::Done(TurnOutcome {
                        reply,
                        tool_calls: calls,
                        ignored_tool_calls,
                    })
                }
                TurnState::Done(outcome) => return Ok(outcome),
            };
            debug!(state = next.name(), "Turn state transition");
            state = next;
        }
    }

    fn record_first_reply(completion: Completion, history: &mut ConversationHistory) -> TurnState {
        if completion.tool_calls.is_empty() {
            let reply = completion.text.unwrap_or_default();
            history.push(Message::assistant(reply.clone()));
            return TurnState::Done(TurnOutcome {
                reply,
                tool_calls: vec![],
                ignored_tool_calls: 0,
            });
        }

        let calls = completion.tool_calls;
        info!(
            count = calls.len(),
            tools = ?calls.iter().map(|call| call.tool_name.as_str()).collect::<Vec<_>>(),
            "Model requested tool calls"
        );
        history.push(Message::assistant_with_calls(
            Some(completion.text.unwrap_or_default()),
            calls.clone(),
        ));
        TurnState::DispatchingTools { calls }
    }
}

/// Run one call to completion. Never fails: every error becomes the result text.
async fn dispatch(call: &ToolCallRequest, provider: &mut dyn ToolProvider) -> String {
    let arguments = match decode_arguments(&call.arguments) {
        Ok(arguments) => arguments,
        Err(err) => {
            warn!(tool = call.tool_name.as_str(), %err, "Undecodable tool arguments");
            return format!(
                "Error: could not parse arguments for tool '{}': {err}",
                call.tool_name
            );
        }
    };

    match provider.call_tool(&call.tool_name, arguments).await {
        Ok(result) => normalize_text(&result),
        Err(err) => {
            warn!(tool = call.tool_name.as_str(), %err, "Tool call failed");
            format!("Error: tool '{}' failed: {err}", call.tool_name)
        }
    }
}

/// Decode raw model-produced arguments. Blank input means "no arguments".
pub fn decode_arguments(raw: &str) -> Result<Value, ToolArgumentError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_str(raw).map_err(ToolArgumentError::Malformed)? {
        Value::Object(map) => Ok(Value::Object(map)),
        Value::Null => Err(ToolArgumentError::NotAnObject("null")),
        Value::Bool(_) => Err(ToolArgumentError::NotAnObject("a boolean")),
        Value::Number(_) => Err(ToolArgumentError::NotAnObject("a number")),
        Value::String(_) => Err(ToolArgumentError::NotAnObject("a string")),
        Value::Array(_) => Err(ToolArgumentError::NotAnObject("an array")),
    }
}
