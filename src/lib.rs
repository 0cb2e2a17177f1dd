//! scenechat - streaming animation chat agent
//!
//! A chat agent for programmatic animation authoring: the model streams its
//! answer, may call a `get_preview` tool to render its script to frames,
//! inspects the injected frames, and iterates before producing final code.
//!
//! # Architecture
//!
//! - **Core**: shared types, configuration, and error handling
//! - **LLM**: stream-client contract with OpenAI and Groq backends
//! - **Agent**: the orchestration loop, conversation state, and artifact window
//! - **Tools**: the preview invoker boundary and its Manim implementation
//!
//! # Usage
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use scenechat::{run_chat, ChatRequest, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load();
//!     let request = ChatRequest {
//!         prompt: Some("Animate a bouncing ball".into()),
//!         ..Default::default()
//!     };
//!
//!     let mut records = run_chat(request, &config).unwrap();
//!     while let Some(record) = records.next().await {
//!         print!("{}", record.to_line());
//!     }
//! }
//! ```

pub mod agent;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{run_chat, ChatRequest, Orchestrator};
pub use core::{ChatRecord, Config, Result, SceneChatError};
pub use tools::ManimInvoker;
