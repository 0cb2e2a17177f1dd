//! LLM module - streaming model backend integrations
//!
//! Provides the stream-client contract with OpenAI and Groq implementations,
//! selected once at request-validation time.

pub mod groq;
pub mod models;
pub mod openai;
pub mod sse;
pub mod traits;
pub mod wire;

use std::sync::Arc;

use crate::core::{Config, Result};

pub use groq::GroqClient;
pub use models::Engine;
pub use openai::OpenAiClient;
pub use traits::{EventStream, ModelStreamClient, StreamEvent};

/// Build the stream client for a validated engine.
pub fn client_for_engine(engine: Engine, config: &Config) -> Result<Arc<dyn ModelStreamClient>> {
    Ok(match engine {
        Engine::OpenAi => Arc::new(OpenAiClient::from_config(config)?),
        Engine::Groq => Arc::new(GroqClient::from_config(config)?),
    })
}
