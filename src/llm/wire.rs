//! Chat-completions wire format shared by both backends
//!
//! Converts the internal message log into the OpenAI-compatible request
//! shape. User messages with attachments become multi-part content with
//! data-URL image entries; assistant tool calls and tool results use the
//! `tool_calls` / `tool` role shape.

use serde::Serialize;

use crate::core::{Message, Role, ToolDefinition};

/// Synthetic call id: only one tool call can be in flight per turn.
const CALL_ID: &str = "call_0";

/// A message as sent over the wire.
#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Streaming chat-completions request body.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: &'static str,
    pub stream: bool,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(model: &'a str, messages: &[Message], tool: &ToolDefinition) -> Self {
        Self {
            model,
            messages: messages.iter().map(to_wire_message).collect(),
            tools: vec![serde_json::json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })],
            tool_choice: "auto",
            stream: true,
        }
    }
}

/// Convert an internal message to the wire shape.
pub fn to_wire_message(msg: &Message) -> WireMessage {
    match msg.role {
        Role::System => WireMessage {
            role: "system",
            content: msg.text.clone().map(serde_json::Value::String),
            tool_calls: None,
            tool_call_id: None,
        },
        Role::User => {
            let content = if msg.attachments.is_empty() {
                msg.text.clone().map(serde_json::Value::String)
            } else {
                let mut parts = Vec::with_capacity(msg.attachments.len() + 1);
                if let Some(ref text) = msg.text {
                    parts.push(serde_json::json!({ "type": "text", "text": text }));
                }
                for artifact in &msg.attachments {
                    parts.push(serde_json::json!({
                        "type": "image_url",
                        "image_url": { "url": artifact.data_url() }
                    }));
                }
                Some(serde_json::Value::Array(parts))
            };
            WireMessage {
                role: "user",
                content,
                tool_calls: None,
                tool_call_id: None,
            }
        }
        Role::Assistant => WireMessage {
            role: "assistant",
            content: msg.text.clone().map(serde_json::Value::String),
            tool_calls: msg.tool_call.as_ref().map(|call| {
                vec![serde_json::json!({
                    "id": CALL_ID,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.raw_arguments,
                    }
                })]
            }),
            tool_call_id: None,
        },
        Role::Tool => WireMessage {
            role: "tool",
            content: msg.text.clone().map(serde_json::Value::String),
            tool_calls: None,
            tool_call_id: Some(CALL_ID.to_string()),
        },
    }
}
