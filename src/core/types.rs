//! Shared types used across scenechat modules
//!
//! Contains the conversation message structures, artifact data, tool
//! definitions, and the caller-facing record protocol.

use serde::{Deserialize, Serialize};

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// A tool-result message answering a prior tool call.
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One visual output unit produced by a tool call.
///
/// Exclusively owned by the message that carries it; created only from tool
/// results, destroyed only by window eviction or conversation end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Position within the originating tool call's output (sort order).
    pub ordinal: usize,
    /// Base64-encoded PNG bytes, already size-reduced by the tool.
    pub payload: String,
}

impl Artifact {
    pub fn new(ordinal: usize, payload: impl Into<String>) -> Self {
        Self {
            ordinal,
            payload: payload.into(),
        }
    }

    /// Data URL form used when serializing the artifact into a message.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.payload)
    }
}

/// A tool call assembled from streamed deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool the model wants to invoke.
    pub name: String,
    /// Raw argument JSON exactly as the model produced it.
    pub raw_arguments: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, raw_arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }
}

/// A message in a conversation.
///
/// Messages are immutable once appended; the log is append-only except for
/// whole-message eviction by the artifact window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender.
    pub role: Role,
    /// Text content, if any. An assistant message that carries a tool call
    /// has no final text (it is mid-turn, not a completed answer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Ordered artifacts attached to this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Artifact>,
    /// Tool call made by the assistant, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    /// For tool-role messages: the tool name this message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result_of: Option<String>,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: Some(text.into()),
            attachments: Vec::new(),
            tool_call: None,
            tool_result_of: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: Some(text.into()),
            attachments: Vec::new(),
            tool_call: None,
            tool_result_of: None,
        }
    }

    /// Create a new system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            text: Some(text.into()),
            attachments: Vec::new(),
            tool_call: None,
            tool_result_of: None,
        }
    }

    /// Create an assistant message carrying a tool call (no final text).
    pub fn assistant_tool_call(call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            text: None,
            attachments: Vec::new(),
            tool_call: Some(call),
            tool_result_of: None,
        }
    }

    /// Create a tool-role message answering the named tool.
    pub fn tool_result(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            text: Some(content.into()),
            attachments: Vec::new(),
            tool_call: None,
            tool_result_of: Some(tool_name.into()),
        }
    }

    /// Create a user message carrying artifacts and an instructional caption.
    pub fn user_with_artifacts(caption: impl Into<String>, artifacts: Vec<Artifact>) -> Self {
        Self {
            role: Role::User,
            text: Some(caption.into()),
            attachments: artifacts,
            tool_call: None,
            tool_result_of: None,
        }
    }

    /// Number of artifacts attached to this message.
    pub fn artifact_count(&self) -> usize {
        self.attachments.len()
    }
}

// Payload bytes are opaque; structural equality is enough for callers and
// tests.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.text == other.text
            && self.attachments.len() == other.attachments.len()
            && self.tool_result_of == other.tool_result_of
    }
}

/// Definition of the single tool advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the function.
    pub name: String,
    /// Description of what the function does.
    pub description: String,
    /// JSON Schema for the parameters.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// One record of the caller-facing emission protocol.
///
/// Records are serialized as newline-delimited JSON so the caller can parse
/// each independently without buffering the whole stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatRecord {
    /// A text delta from the model.
    Text(String),
    /// The model started a tool call with this name.
    FunctionCallName(String),
    /// A fragment of the tool call's arguments.
    FunctionCallArgs(String),
    /// The tool's textual result.
    FunctionResult { name: String, content: String },
    /// The raw serialized synthetic user message carrying injected artifacts.
    ArtifactInjection(Message),
    /// Terminal error record; at most one per request, exclusive with the
    /// terminal text marker.
    Error(String),
}

impl ChatRecord {
    /// Serialize this record as one newline-terminated JSON line.
    pub fn to_line(&self) -> String {
        let value = match self {
            ChatRecord::Text(text) => serde_json::json!({ "type": "text", "text": text }),
            ChatRecord::FunctionCallName(name) => serde_json::json!({
                "type": "function_call",
                "content": "",
                "function_call": { "name": name }
            }),
            ChatRecord::FunctionCallArgs(args) => serde_json::json!({
                "type": "function_call",
                "content": "",
                "function_call": { "args": args }
            }),
            ChatRecord::FunctionResult { name, content } => serde_json::json!({
                "type": "function_result",
                "content": content,
                "function_call": { "name": name }
            }),
            ChatRecord::ArtifactInjection(message) => {
                serde_json::to_value(message).unwrap_or_else(|_| serde_json::json!({}))
            }
            ChatRecord::Error(error) => serde_json::json!({ "error": error }),
        };
        format!("{}\n", value)
    }
}
