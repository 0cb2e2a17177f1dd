//! Integration tests for the orchestration loop
//!
//! Uses a scripted model backend and a stub preview invoker so every control
//! path of the loop can be exercised without network or subprocess access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;

use scenechat::agent::{ArtifactWindow, ChatRequest, Orchestrator};
use scenechat::core::config::AgentConfig;
use scenechat::core::{Artifact, ChatRecord, Message, Result, SceneChatError, ToolDefinition};
use scenechat::llm::{EventStream, ModelStreamClient, StreamEvent};
use scenechat::tools::{PreviewInvoker, PreviewOutcome};

/// One scripted streaming turn.
enum Turn {
    /// `stream()` fails with a transient error before yielding anything.
    Transient,
    /// `stream()` yields these events.
    Events(Vec<StreamEvent>),
}

/// Backend that plays back scripted turns; when the script runs out it
/// repeats `fallback` forever (or ends the conversation if none is set).
struct ScriptedClient {
    turns: Mutex<VecDeque<Turn>>,
    fallback: Option<Vec<StreamEvent>>,
}

impl ScriptedClient {
    fn new(turns: Vec<Turn>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            fallback: None,
        })
    }

    fn repeating(events: Vec<StreamEvent>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(VecDeque::new()),
            fallback: Some(events),
        })
    }
}

#[async_trait]
impl ModelStreamClient for ScriptedClient {
    async fn stream(
        &self,
        _model: &str,
        _messages: &[Message],
        _tool: &ToolDefinition,
    ) -> Result<EventStream> {
        let turn = self.turns.lock().unwrap().pop_front();
        let events = match turn {
            Some(Turn::Transient) => return Err(SceneChatError::transient("stubbed outage")),
            Some(Turn::Events(events)) => events,
            None => self
                .fallback
                .clone()
                .unwrap_or_else(|| vec![StreamEvent::End]),
        };
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Invoker that records its calls and returns a fixed outcome.
struct StubInvoker {
    calls: AtomicUsize,
    artifacts_per_call: usize,
}

impl StubInvoker {
    fn new(artifacts_per_call: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            artifacts_per_call,
        })
    }
}

#[async_trait]
impl PreviewInvoker for StubInvoker {
    async fn execute(&self, _script: &str, _entry_name: &str) -> PreviewOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let artifacts = (0..self.artifacts_per_call)
            .map(|i| Artifact::new(i, "AA=="))
            .collect();
        PreviewOutcome::success("Animation preview generated.", artifacts)
    }
}

fn agent_config(max_iterations: usize) -> AgentConfig {
    AgentConfig {
        max_iterations,
        artifact_ceiling: 50,
        max_retries: 3,
        retry_delay_secs: 0, // no waiting in tests
        debug: false,
    }
}

fn request(prompt: &str) -> ChatRequest {
    ChatRequest {
        prompt: Some(prompt.to_string()),
        ..Default::default()
    }
}

fn tool_call_turn(name: &str, fragments: &[&str]) -> Turn {
    let mut events = vec![StreamEvent::ToolCallStart(name.to_string())];
    events.extend(
        fragments
            .iter()
            .map(|f| StreamEvent::ToolCallArgsDelta(f.to_string())),
    );
    events.push(StreamEvent::End);
    Turn::Events(events)
}

async fn run_to_records(
    client: Arc<ScriptedClient>,
    invoker: Arc<StubInvoker>,
    agent: AgentConfig,
    ceiling: Option<usize>,
) -> Vec<ChatRecord> {
    let orchestrator = Orchestrator::new(
        client,
        invoker,
        ArtifactWindow::new(ceiling),
        "stub-model",
        &agent,
    );
    orchestrator
        .run(request("animate a circle"))
        .collect()
        .await
}

#[tokio::test]
async fn plain_answer_ends_with_terminal_marker() {
    let client = ScriptedClient::new(vec![Turn::Events(vec![
        StreamEvent::TextDelta("Here you ".into()),
        StreamEvent::TextDelta("go".into()),
        StreamEvent::End,
    ])]);
    let invoker = StubInvoker::new(0);

    let records = run_to_records(client, invoker.clone(), agent_config(5), Some(50)).await;

    assert_eq!(
        records,
        vec![
            ChatRecord::Text("Here you ".into()),
            ChatRecord::Text("go".into()),
            ChatRecord::Text("\n".into()),
        ]
    );
    assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tool_round_trip_preserves_record_order() {
    let client = ScriptedClient::new(vec![
        tool_call_turn(
            "get_preview",
            &["{\"code\":\"circle\",", "\"class_name\":\"Demo\"}"],
        ),
        Turn::Events(vec![
            StreamEvent::TextDelta("Final code".into()),
            StreamEvent::End,
        ]),
    ]);
    let invoker = StubInvoker::new(8);

    let records = run_to_records(client, invoker.clone(), agent_config(5), Some(50)).await;

    assert_eq!(invoker.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        records[0],
        ChatRecord::FunctionCallName("get_preview".into())
    );
    assert!(matches!(records[1], ChatRecord::FunctionCallArgs(_)));
    assert!(matches!(records[2], ChatRecord::FunctionCallArgs(_)));
    assert!(matches!(records[3], ChatRecord::FunctionResult { .. }));
    assert!(matches!(records[4], ChatRecord::ArtifactInjection(_)));
    // The next turn's text comes strictly after the injection.
    assert_eq!(records[5], ChatRecord::Text("Final code".into()));
    assert_eq!(records[6], ChatRecord::Text("\n".into()));
}

#[tokio::test]
async fn tool_happy_model_halts_at_iteration_cap() {
    let client = ScriptedClient::repeating(vec![
        StreamEvent::ToolCallStart("get_preview".into()),
        StreamEvent::ToolCallArgsDelta("{\"code\":\"x\",\"class_name\":\"D\"}".into()),
        StreamEvent::End,
    ]);
    let invoker = StubInvoker::new(2);

    let records = run_to_records(client, invoker.clone(), agent_config(3), Some(50)).await;

    assert_eq!(invoker.calls.load(Ordering::SeqCst), 3);
    let results = records
        .iter()
        .filter(|r| matches!(r, ChatRecord::FunctionResult { .. }))
        .count();
    assert_eq!(results, 3);
    assert_eq!(records.last(), Some(&ChatRecord::Text("\n".into())));
}

#[tokio::test]
async fn retry_exhaustion_yields_exactly_one_error_record() {
    let client = ScriptedClient::new(vec![Turn::Transient, Turn::Transient, Turn::Transient]);
    let invoker = StubInvoker::new(0);

    let records = run_to_records(client, invoker, agent_config(5), Some(50)).await;

    assert_eq!(records.len(), 1);
    assert!(matches!(records[0], ChatRecord::Error(_)));
}

#[tokio::test]
async fn transient_failure_then_success_recovers_silently() {
    let client = ScriptedClient::new(vec![
        Turn::Transient,
        Turn::Events(vec![
            StreamEvent::TextDelta("recovered".into()),
            StreamEvent::End,
        ]),
    ]);
    let invoker = StubInvoker::new(0);

    let records = run_to_records(client, invoker, agent_config(5), Some(50)).await;

    assert_eq!(
        records,
        vec![
            ChatRecord::Text("recovered".into()),
            ChatRecord::Text("\n".into()),
        ]
    );
}

#[tokio::test]
async fn unrecognized_tool_is_never_executed() {
    let client = ScriptedClient::new(vec![tool_call_turn("unknown_tool", &["{}"])]);
    let invoker = StubInvoker::new(0);

    let records = run_to_records(client, invoker.clone(), agent_config(5), Some(50)).await;

    assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    assert!(!records
        .iter()
        .any(|r| matches!(r, ChatRecord::FunctionResult { .. })));
    assert_eq!(records.last(), Some(&ChatRecord::Text("\n".into())));
}

#[tokio::test]
async fn unparseable_arguments_become_a_tool_failure() {
    let client = ScriptedClient::new(vec![
        tool_call_turn("get_preview", &["{not json"]),
        Turn::Events(vec![StreamEvent::End]),
    ]);
    let invoker = StubInvoker::new(0);

    let records = run_to_records(client, invoker.clone(), agent_config(5), Some(50)).await;

    assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    let failure = records.iter().find_map(|r| match r {
        ChatRecord::FunctionResult { content, .. } => Some(content.clone()),
        _ => None,
    });
    assert!(failure.unwrap().starts_with("ERROR."));
    // The loop continued instead of failing hard.
    assert_eq!(records.last(), Some(&ChatRecord::Text("\n".into())));
}

#[tokio::test]
async fn injected_artifacts_respect_the_ceiling() {
    let client = ScriptedClient::new(vec![
        tool_call_turn("get_preview", &["{\"code\":\"x\",\"class_name\":\"D\"}"]),
        Turn::Events(vec![StreamEvent::End]),
    ]);
    let invoker = StubInvoker::new(60);

    let records = run_to_records(client, invoker, agent_config(5), Some(50)).await;

    let injected = records.iter().find_map(|r| match r {
        ChatRecord::ArtifactInjection(message) => Some(message.attachments.len()),
        _ => None,
    });
    assert_eq!(injected, Some(50));
}
