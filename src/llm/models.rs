//! Engine and model catalog
//!
//! Recognized engine identifiers and their default/allowed model names are a
//! closed set; requests naming anything else are rejected before any
//! streaming begins.

use crate::core::{Result, SceneChatError};

/// A recognized model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    OpenAi,
    Groq,
}

impl Engine {
    /// Parse an engine identifier.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "openai" => Ok(Self::OpenAi),
            "groq" => Ok(Self::Groq),
            other => Err(SceneChatError::validation(format!(
                "Invalid engine '{}'. Must be one of: openai, groq",
                other
            ))),
        }
    }

    /// Default model used when the request names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Groq => "gemma-7b-it",
        }
    }

    /// Models this engine accepts.
    pub fn allowed_models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-4o", "o1-mini"],
            Self::Groq => &[
                "llama-3-70b-8192",
                "llama-3-8b-8192",
                "mixtral-8x7b-32768",
                "gemma-7b-it",
            ],
        }
    }

    /// Validate a requested model, falling back to the default when absent.
    pub fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        let model = match requested {
            Some(m) => m,
            None => return Ok(self.default_model().to_string()),
        };

        if !self.allowed_models().contains(&model) {
            return Err(SceneChatError::validation(format!(
                "Invalid model '{}' for engine '{}'. Valid models are: {}",
                model,
                self.id(),
                self.allowed_models().join(", ")
            )));
        }

        Ok(model.to_string())
    }

    /// Stable identifier used in requests and logs.
    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }

    /// Maximum resident artifacts this engine tolerates in one conversation.
    /// Engines without a documented limit pass artifacts through unchanged.
    pub fn artifact_ceiling(&self, configured: usize) -> Option<usize> {
        match self {
            Self::OpenAi => Some(configured),
            Self::Groq => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse() {
        assert_eq!(Engine::parse("openai").unwrap(), Engine::OpenAi);
        assert_eq!(Engine::parse("groq").unwrap(), Engine::Groq);
        assert!(matches!(
            Engine::parse("deepseek"),
            Err(SceneChatError::Validation(_))
        ));
    }

    #[test]
    fn test_model_resolution() {
        assert_eq!(Engine::OpenAi.resolve_model(None).unwrap(), "gpt-4o");
        assert_eq!(Engine::Groq.resolve_model(None).unwrap(), "gemma-7b-it");
        assert_eq!(
            Engine::Groq.resolve_model(Some("llama-3-70b-8192")).unwrap(),
            "llama-3-70b-8192"
        );
        assert!(matches!(
            Engine::OpenAi.resolve_model(Some("llama-3-8b-8192")),
            Err(SceneChatError::Validation(_))
        ));
    }

    #[test]
    fn test_ceiling_per_engine() {
        assert_eq!(Engine::OpenAi.artifact_ceiling(50), Some(50));
        assert_eq!(Engine::Groq.artifact_ceiling(50), None);
    }
}
