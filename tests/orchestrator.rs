use wayfarer::backend::{BackendError, Completion, LmBackend};
use wayfarer::catalog::FunctionSchema;
use wayfarer::orchestrator::{Orchestrator, TurnError};
use wayfarer::provider::{LocalProvider, ProviderError, ToolProvider, ToolResult};
use wayfarer::tools::{BookingStore, ToolContext, WeatherClient, travel_toolset};
use wayfarer::types::{ConversationHistory, Message, Role, ToolCallRequest, ToolDescriptor};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct Request {
    messages: Vec<Message>,
    tools: Option<Vec<FunctionSchema>>,
}

/// Replays canned completions and records every request it receives.
#[derive(Clone, Default)]
struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<Result<Completion, BackendError>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl ScriptedBackend {
    fn new(replies: impl IntoIterator<Item = Result<Completion, BackendError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl LmBackend for ScriptedBackend {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[FunctionSchema]>,
    ) -> Result<Completion, BackendError> {
        self.requests.lock().expect("lock").push(Request {
            messages: messages.to_vec(),
            tools: tools.map(<[FunctionSchema]>::to_vec),
        });
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .expect("backend was asked for more completions than scripted")
    }
}

/// Wraps another provider and counts what reaches it.
struct RecordingProvider<P> {
    inner: P,
    catalog_fetches: usize,
    calls: Vec<(String, Value)>,
}

impl<P> RecordingProvider<P> {
    fn new(inner: P) -> Self {
        Self {
            inner,
            catalog_fetches: 0,
            calls: vec![],
        }
    }
}

#[async_trait]
impl<P: ToolProvider> ToolProvider for RecordingProvider<P> {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        self.catalog_fetches += 1;
        self.inner.list_tools().await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ProviderError> {
        self.calls.push((name.to_string(), arguments.clone()));
        self.inner.call_tool(name, arguments).await
    }
}

struct UnreachableProvider;

#[async_trait]
impl ToolProvider for UnreachableProvider {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Err(ProviderError::Closed {
            server: "travel".to_string(),
        })
    }

    async fn call_tool(&mut self, name: &str, _: Value) -> Result<ToolResult, ProviderError> {
        panic!("tool '{name}' dispatched without a catalog");
    }
}

fn travel_provider() -> (TempDir, RecordingProvider<LocalProvider<ToolContext>>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let context = ToolContext::new(BookingStore::new(dir.path()), WeatherClient::default());
    let provider = LocalProvider::new(travel_toolset().expect("travel tools"), context);
    (dir, RecordingProvider::new(provider))
}

fn call(id: &str, tool: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        tool_name: tool.to_string(),
        arguments: arguments.to_string(),
    }
}

fn history() -> ConversationHistory {
    ConversationHistory::with_system_prompt("You are a travel assistant.")
}

const PARIS_TRIP: &str = r#"{"traveler_name":"Jane","destination":"Paris","start_date":"2025-06-01","end_date":"2025-06-10","budget":2000}"#;

#[tokio::test]
async fn plain_reply_appends_user_and_assistant_only() {
    let backend = ScriptedBackend::new([Ok(Completion::text("Hello there!"))]);
    let orchestrator = Orchestrator::new(backend.clone());
    let (_dir, mut provider) = travel_provider();
    let mut history = history();

    let outcome = orchestrator
        .handle_turn("hi", &mut history, &mut provider)
        .await
        .expect("turn");

    assert_eq!(outcome.reply, "Hello there!");
    assert!(outcome.tool_calls.is_empty());
    assert_eq!(history.len(), 3);
    assert_eq!(history.since(1)[0], Message::user("hi"));
    assert_eq!(history.since(1)[1], Message::assistant("Hello there!"));
    assert_eq!(provider.catalog_fetches, 1);
    assert!(provider.calls.is_empty());

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let tools = requests[0].tools.as_ref().expect("catalog offered");
    assert_eq!(tools.len(), 5);
}

#[tokio::test]
async fn tool_round_appends_n_plus_three_messages_in_request_order() {
    let calls = vec![
        call("call_a", "greet", r#"{"name":"Jane"}"#),
        call("call_b", "recommend_trip", r#"{"destination":"Tokyo","budget":500,"duration_days":4}"#),
        call("call_c", "greet", r#"{"name":"Ford"}"#),
    ];
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(calls.clone())),
        Ok(Completion::text("All done.")),
    ]);
    let orchestrator = Orchestrator::new(backend.clone());
    let (_dir, mut provider) = travel_provider();
    let mut history = history();
    let before = history.len();

    let outcome = orchestrator
        .handle_turn("greet us and plan Tokyo", &mut history, &mut provider)
        .await
        .expect("turn");

    assert_eq!(history.len() - before, calls.len() + 3);
    let appended = history.since(before);
    assert_eq!(appended[0].role, Role::User);
    assert_eq!(appended[1].role, Role::Assistant);
    assert_eq!(appended[1].tool_calls, calls);

    let tool_messages = &appended[2..2 + calls.len()];
    for (message, call) in tool_messages.iter().zip(&calls) {
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some(call.id.as_str()));
    }
    assert_eq!(tool_messages[0].text(), "Hello, Jane!");
    assert!(tool_messages[1].text().starts_with("Trip recommendation for Tokyo"));
    assert_eq!(tool_messages[2].text(), "Hello, Ford!");
    assert_eq!(appended[5], Message::assistant("All done."));

    let dispatched: Vec<_> = provider.calls.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(dispatched, ["greet", "recommend_trip", "greet"]);
    assert_eq!(outcome.tool_calls, calls);
    assert_eq!(outcome.reply, "All done.");

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].tools.is_none(), "final completion carries no tool definitions");
    assert_eq!(requests[1].messages, history.messages()[..history.len() - 1]);
}

#[tokio::test]
async fn dependent_calls_observe_earlier_effects() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![
            call("call_trip", "book_trip", PARIS_TRIP),
            call(
                "call_flight",
                "book_transportation",
                r#"{"booking_id":"CURRENT_TRIP","transport_type":"flight","departure":"New York","arrival":"Paris","departure_time":"2025-06-01 09:30"}"#,
            ),
        ])),
        Ok(Completion::text("Trip and flight booked.")),
    ]);
    let orchestrator = Orchestrator::new(backend);
    let (dir, mut provider) = travel_provider();
    let mut history = history();

    orchestrator
        .handle_turn("book Paris and a flight", &mut history, &mut provider)
        .await
        .expect("turn");

    let transport = history
        .messages()
        .iter()
        .find(|message| message.tool_call_id.as_deref() == Some("call_flight"))
        .expect("transport result");
    assert!(
        transport
            .text()
            .contains("Linked to trip: CURRENT_TRIP (Paris, 2025-06-01 to 2025-06-10, Jane)"),
        "unexpected transport confirmation: {}",
        transport.text()
    );
    assert!(dir.path().join("current_trip.json").exists());
    assert!(dir.path().join("current_transport.json").exists());
}

#[tokio::test]
async fn paris_booking_scenario() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![call("call_1", "book_trip", PARIS_TRIP)])),
        Ok(Completion::text(
            "Your Paris trip for Jane is booked from 2025-06-01 to 2025-06-10 (booking CURRENT_TRIP).",
        )),
    ]);
    let orchestrator = Orchestrator::new(backend.clone());
    let (dir, mut provider) = travel_provider();
    let mut history = history();

    let outcome = orchestrator
        .handle_turn(
            "Book a trip to Paris for Jane from 2025-06-01 to 2025-06-10 with a $2000 budget",
            &mut history,
            &mut provider,
        )
        .await
        .expect("turn");

    assert_eq!(provider.calls.len(), 1);
    let (name, arguments) = &provider.calls[0];
    assert_eq!(name, "book_trip");
    assert_eq!(arguments["traveler_name"], "Jane");
    assert_eq!(arguments["destination"], "Paris");
    assert_eq!(arguments["start_date"], "2025-06-01");
    assert_eq!(arguments["end_date"], "2025-06-10");
    assert_eq!(arguments["budget"], 2000);

    let final_request = &backend.requests()[1];
    let confirmation = final_request.messages.last().expect("tool message");
    assert_eq!(confirmation.role, Role::Tool);
    assert!(confirmation.text().starts_with("Trip booked successfully!"));
    assert!(confirmation.text().contains("Booking ID: CURRENT_TRIP"));

    assert!(!outcome.reply.is_empty());
    assert_eq!(history.last(), Some(&Message::assistant(outcome.reply.clone())));

    let stored = BookingStore::new(dir.path())
        .load_trip()
        .expect("readable")
        .expect("trip stored");
    assert_eq!(stored.traveler_name, "Jane");
    assert_eq!(stored.budget, 2000);
}

#[tokio::test]
async fn catalog_failure_leaves_history_untouched() {
    let backend = ScriptedBackend::default();
    let orchestrator = Orchestrator::new(backend.clone());
    let mut history = history();
    let before = history.clone();

    let result = orchestrator
        .handle_turn("hello?", &mut history, &mut UnreachableProvider)
        .await;

    assert!(matches!(result, Err(TurnError::ProviderUnavailable(_))));
    assert_eq!(history, before);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn undecodable_arguments_become_readable_tool_results() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![
            call("call_bad", "book_trip", r#"{"traveler_name": "Jane", "destin"#),
            call("call_ok", "greet", r#"{"name":"Jane"}"#),
        ])),
        Ok(Completion::text("I could not book that trip, but hello Jane.")),
    ]);
    let orchestrator = Orchestrator::new(backend);
    let (_dir, mut provider) = travel_provider();
    let mut history = history();

    let outcome = orchestrator
        .handle_turn("book something", &mut history, &mut provider)
        .await
        .expect("turn still completes");

    let bad = history
        .messages()
        .iter()
        .find(|message| message.tool_call_id.as_deref() == Some("call_bad"))
        .expect("tool message for the bad call");
    assert!(
        bad.text()
            .starts_with("Error: could not parse arguments for tool 'book_trip'")
    );
    let dispatched: Vec<_> = provider.calls.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(dispatched, ["greet"]);
    assert_eq!(outcome.reply, "I could not book that trip, but hello Jane.");
    assert_eq!(history.last().map(|m| m.role), Some(Role::Assistant));
}

#[tokio::test]
async fn arguments_the_tool_rejects_become_error_text() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![call(
            "call_1",
            "recommend_trip",
            r#"{"destination":"Paris"}"#,
        )])),
        Ok(Completion::text("Which budget?")),
    ]);
    let orchestrator = Orchestrator::new(backend);
    let (_dir, mut provider) = travel_provider();
    let mut history = history();

    orchestrator
        .handle_turn("recommend Paris", &mut history, &mut provider)
        .await
        .expect("turn");

    let result = &history.messages()[history.len() - 2];
    assert_eq!(result.role, Role::Tool);
    assert!(result.text().starts_with("Error: tool 'recommend_trip' failed:"));
}

#[tokio::test]
async fn first_completion_failure_keeps_only_the_user_message() {
    let backend = ScriptedBackend::new([Err(BackendError::EmptyResponse)]);
    let orchestrator = Orchestrator::new(backend);
    let (_dir, mut provider) = travel_provider();
    let mut history = history();

    let result = orchestrator
        .handle_turn("hi", &mut history, &mut provider)
        .await;

    assert!(matches!(result, Err(TurnError::Backend(_))));
    assert_eq!(history.len(), 2);
    assert_eq!(history.last(), Some(&Message::user("hi")));
}

#[tokio::test]
async fn final_completion_failure_keeps_dispatched_results() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![call("call_1", "greet", r#"{"name":"Jane"}"#)])),
        Err(BackendError::EmptyResponse),
    ]);
    let orchestrator = Orchestrator::new(backend);
    let (_dir, mut provider) = travel_provider();
    let mut history = history();
    let before = history.len();

    let result = orchestrator
        .handle_turn("greet Jane", &mut history, &mut provider)
        .await;

    assert!(matches!(result, Err(TurnError::Backend(_))));
    let roles: Vec<_> = history.since(before).iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::Tool]);
    assert_eq!(history.last(), Some(&Message::tool("call_1", "Hello, Jane!")));
    assert_eq!(provider.calls.len(), 1);
}

#[tokio::test]
async fn second_round_tool_calls_are_counted_not_dispatched() {
    let backend = ScriptedBackend::new([
        Ok(Completion::tool_calls(vec![call("call_1", "greet", r#"{"name":"Jane"}"#)])),
        Ok(Completion {
            text: Some("Greeted Jane.".to_string()),
            tool_calls: vec![call("call_2", "greet", r#"{"name":"again"}"#)],
        }),
    ]);
    let orchestrator = Orchestrator::new(backend);
    let (_dir, mut provider) = travel_provider();
    let mut history = history();

    let outcome = orchestrator
        .handle_turn("greet Jane", &mut history, &mut provider)
        .await
        .expect("turn");

    assert_eq!(outcome.ignored_tool_calls, 1);
    assert_eq!(provider.calls.len(), 1);
    assert_eq!(history.len(), 1 + 4);
    assert_eq!(history.last(), Some(&Message::assistant("Greeted Jane.")));
}
