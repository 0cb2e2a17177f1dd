//! Orchestration loop
//!
//! The top-level controller: streams one turn from the model backend while
//! assembling any tool call out of fragmented deltas, executes the preview
//! tool out-of-band, folds the result plus a windowed batch of its frames
//! back into the conversation, and re-enters the model until it stops
//! requesting the tool. Transient stream failures are retried on a fixed
//! schedule; a bounded iteration counter guarantees termination.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::agent::accumulator::ToolCallAccumulator;
use crate::agent::conversation::ConversationState;
use crate::agent::prompts;
use crate::agent::window::{select_artifacts, ArtifactWindow};
use crate::core::config::AgentConfig;
use crate::core::{ChatRecord, Config, Message, Result, ToolDefinition};
use crate::llm::{client_for_engine, Engine, ModelStreamClient, StreamEvent};
use crate::tools::{
    preview_tool_definition, ManimInvoker, PreviewArgs, PreviewInvoker, PreviewOutcome,
    PREVIEW_TOOL_NAME,
};

/// One chat request as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Prior conversation turns; may be empty for a fresh conversation.
    pub messages: Vec<Message>,
    /// Initial prompt, used when `messages` is empty.
    pub prompt: Option<String>,
    /// Engine identifier ("openai" or "groq"); defaults to "openai".
    pub engine: Option<String>,
    /// Model name; defaults to the engine's default model.
    pub model: Option<String>,
    /// Caller identity; generated when absent.
    pub user_id: Option<String>,
    /// Title of the project the user is working on.
    pub project_title: String,
    /// Scenes that make up the project's video, for context.
    pub scenes: Vec<String>,
    /// Custom rules the user configured for the assistant.
    pub global_prompt: String,
}

/// Phase of the orchestration loop, used for debug tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Streaming,
    ToolPending,
    ToolExecuting,
    Injecting,
    Done,
    Failed,
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopPhase::Streaming => "streaming",
            LoopPhase::ToolPending => "tool_pending",
            LoopPhase::ToolExecuting => "tool_executing",
            LoopPhase::Injecting => "injecting",
            LoopPhase::Done => "done",
            LoopPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Drives one conversation request to completion.
pub struct Orchestrator {
    client: Arc<dyn ModelStreamClient>,
    invoker: Arc<dyn PreviewInvoker>,
    window: ArtifactWindow,
    model: String,
    max_retries: usize,
    retry_delay: Duration,
    max_iterations: usize,
    debug: bool,
}

/// Validate a request and run it, returning the caller-facing record stream.
///
/// Engine and model are checked before any streaming begins; a bad name
/// fails the request here, never mid-stream.
pub fn run_chat(
    request: ChatRequest,
    config: &Config,
) -> Result<UnboundedReceiverStream<ChatRecord>> {
    let engine = Engine::parse(request.engine.as_deref().unwrap_or("openai"))?;
    let model = engine.resolve_model(request.model.as_deref())?;
    let client = client_for_engine(engine, config)?;
    let invoker: Arc<dyn PreviewInvoker> = Arc::new(ManimInvoker::from_config(config));
    let window = ArtifactWindow::new(engine.artifact_ceiling(config.agent.artifact_ceiling));

    let orchestrator = Orchestrator::new(client, invoker, window, model, &config.agent);
    Ok(orchestrator.run(request))
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ModelStreamClient>,
        invoker: Arc<dyn PreviewInvoker>,
        window: ArtifactWindow,
        model: impl Into<String>,
        agent: &AgentConfig,
    ) -> Self {
        Self {
            client,
            invoker,
            window,
            model: model.into(),
            max_retries: agent.max_retries,
            retry_delay: Duration::from_secs(agent.retry_delay_secs),
            max_iterations: agent.max_iterations,
            debug: agent.debug,
        }
    }

    /// Run the loop on a background task; the returned stream yields the
    /// emission-protocol records in order. Dropping the stream abandons
    /// delivery but lets a committed tool invocation run to completion.
    pub fn run(self, request: ChatRequest) -> UnboundedReceiverStream<ChatRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            self.drive(request, tx).await;
        });
        UnboundedReceiverStream::new(rx)
    }

    async fn drive(self, request: ChatRequest, tx: UnboundedSender<ChatRecord>) {
        let user_id = request
            .user_id
            .clone()
            .unwrap_or_else(|| format!("user-{}", uuid::Uuid::new_v4()));
        self.debug_log(&format!(
            "chat for {} on model {} ({})",
            user_id,
            self.model,
            self.client.name()
        ));

        let mut conversation = self.seed_conversation(request);
        let tool = preview_tool_definition();
        let mut phase = LoopPhase::Streaming;
        let mut iterations = 0usize;

        loop {
            // STREAMING, with the per-turn retry budget for transient errors.
            let accumulator = {
                let mut attempt = 1;
                loop {
                    match self.stream_turn(&conversation, &tool, &tx).await {
                        Ok(acc) => break acc,
                        Err(e) if e.is_transient() && attempt < self.max_retries => {
                            self.debug_log(&format!(
                                "transient stream error (attempt {}/{}): {}; retrying in {:?}",
                                attempt, self.max_retries, e, self.retry_delay
                            ));
                            tokio::time::sleep(self.retry_delay).await;
                            attempt += 1;
                        }
                        Err(e) => {
                            // Retry budget exhausted or fatal: exactly one
                            // error record, then halt. Everything already
                            // appended to the conversation stays valid.
                            self.transition(&mut phase, LoopPhase::Failed);
                            let _ = tx.send(ChatRecord::Error(e.to_string()));
                            return;
                        }
                    }
                }
            };

            let Some(call) = accumulator.finish() else {
                // Ordinary answer: terminal.
                self.transition(&mut phase, LoopPhase::Done);
                let _ = tx.send(ChatRecord::Text("\n".into()));
                return;
            };

            self.transition(&mut phase, LoopPhase::ToolPending);
            conversation.push(Message::assistant_tool_call(call.clone()));

            if call.name != PREVIEW_TOOL_NAME {
                // Unrecognized tool calls are never executed.
                self.debug_log(&format!("unrecognized tool '{}', stopping", call.name));
                self.transition(&mut phase, LoopPhase::Done);
                let _ = tx.send(ChatRecord::Text("\n".into()));
                return;
            }

            self.transition(&mut phase, LoopPhase::ToolExecuting);
            let outcome = match PreviewArgs::parse(&call.raw_arguments) {
                Ok(args) => self.invoker.execute(&args.code, &args.class_name).await,
                // Unparseable arguments are a tool failure the model can
                // react to, not a loop fault.
                Err(e) => PreviewOutcome::failure(format!(
                    "ERROR. Could not parse the `get_preview` arguments: {}. \
                     Call the function again with valid JSON.",
                    e
                )),
            };

            self.transition(&mut phase, LoopPhase::Injecting);
            let _ = tx.send(ChatRecord::FunctionResult {
                name: call.name.clone(),
                content: outcome.summary.clone(),
            });
            conversation.push(Message::tool_result(&call.name, outcome.summary));

            if !outcome.artifacts.is_empty() {
                let budget = self.window.admit(&mut conversation, outcome.artifacts.len());
                let selected = select_artifacts(outcome.artifacts, budget);
                if !selected.is_empty() {
                    let message = Message::user_with_artifacts(prompts::PREVIEW_CAPTION, selected);
                    let _ = tx.send(ChatRecord::ArtifactInjection(message.clone()));
                    conversation.push(message);
                }
            }

            iterations += 1;
            if iterations >= self.max_iterations {
                // Iteration safeguard: the model may never stop asking for
                // the tool on its own.
                self.debug_log(&format!(
                    "iteration cap ({}) reached, stopping",
                    self.max_iterations
                ));
                self.transition(&mut phase, LoopPhase::Done);
                let _ = tx.send(ChatRecord::Text("\n".into()));
                return;
            }

            if tx.is_closed() {
                // Caller disconnected; the committed tool work above ran to
                // completion, its result is simply never delivered.
                self.debug_log("caller disconnected, abandoning loop");
                return;
            }

            self.transition(&mut phase, LoopPhase::Streaming);
        }
    }

    /// Seed the conversation state: system prompt first, then the caller's
    /// log, or a single synthesized user message when only a prompt was
    /// given.
    fn seed_conversation(&self, request: ChatRequest) -> ConversationState {
        let system = Message::system(prompts::system_prompt(
            &request.project_title,
            &request.scenes,
            &request.global_prompt,
        ));

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(system);
        if request.messages.is_empty() {
            if let Some(prompt) = request.prompt {
                messages.push(Message::user(prompt));
            }
        } else {
            messages.extend(request.messages);
        }

        ConversationState::with_messages(messages)
    }

    /// Consume one full streaming turn, forwarding events to the caller and
    /// folding tool-call deltas into a fresh accumulator.
    async fn stream_turn(
        &self,
        conversation: &ConversationState,
        tool: &ToolDefinition,
        tx: &UnboundedSender<ChatRecord>,
    ) -> Result<ToolCallAccumulator> {
        let mut events = self
            .client
            .stream(&self.model, conversation.messages(), tool)
            .await?;

        let mut accumulator = ToolCallAccumulator::new();
        while let Some(event) = events.next().await {
            let event = event?;
            match &event {
                StreamEvent::TextDelta(text) => {
                    let _ = tx.send(ChatRecord::Text(text.clone()));
                }
                StreamEvent::ToolCallStart(name) => {
                    let _ = tx.send(ChatRecord::FunctionCallName(name.clone()));
                }
                StreamEvent::ToolCallArgsDelta(fragment) => {
                    let _ = tx.send(ChatRecord::FunctionCallArgs(fragment.clone()));
                }
                StreamEvent::End => {
                    return Ok(accumulator);
                }
            }
            accumulator.observe(&event);
        }

        // Stream dried up without an End event; treat what we have as the
        // completed turn.
        Ok(accumulator)
    }

    fn transition(&self, phase: &mut LoopPhase, next: LoopPhase) {
        if self.debug && *phase != next {
            eprintln!("DEBUG phase: {} -> {}", phase, next);
        }
        *phase = next;
    }

    fn debug_log(&self, message: &str) {
        if self.debug {
            eprintln!("DEBUG {}", message);
        }
    }
}
