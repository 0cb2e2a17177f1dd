//! Agent module - orchestration and conversation management
//!
//! Contains the loop that coordinates model streaming, tool execution, and
//! the bounded artifact window.

pub mod accumulator;
pub mod conversation;
pub mod orchestrator;
pub mod prompts;
pub mod window;

pub use accumulator::ToolCallAccumulator;
pub use conversation::ConversationState;
pub use orchestrator::{run_chat, ChatRequest, LoopPhase, Orchestrator};
pub use window::{select_artifacts, ArtifactWindow};
