//! Model stream client trait for abstracting the two chat backends
//!
//! The orchestration loop is written against this contract only; it never
//! inspects a specific backend's wire shape.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{Message, Result, ToolDefinition};

/// One incremental event from a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of ordinary answer text.
    TextDelta(String),
    /// The model began a tool call with this name.
    ToolCallStart(String),
    /// A fragment of the tool call's JSON arguments.
    ToolCallArgsDelta(String),
    /// The stream finished cleanly.
    End,
}

/// A live, forward-only sequence of stream events.
///
/// Consuming it is the only way to observe it; dropping it mid-stream
/// releases the underlying network connection.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for streaming model backends.
#[async_trait]
pub trait ModelStreamClient: Send + Sync {
    /// Open a streaming completion request.
    ///
    /// Errors returned here or yielded by the stream are classified as
    /// transient or fatal via [`crate::core::SceneChatError`], so the caller
    /// never pattern-matches on message text.
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<EventStream>;

    /// Get the backend name.
    fn name(&self) -> &str;
}
