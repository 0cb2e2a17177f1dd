//! Configuration management for scenechat
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/scenechat/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, SceneChatError};

/// Main configuration for scenechat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model backend configuration
    pub backends: BackendConfig,
    /// Orchestration loop configuration
    pub agent: AgentConfig,
    /// Preview tool configuration
    pub preview: PreviewConfig,
}

/// Credentials and endpoints for the model backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible base URL
    pub openai_base_url: String,
    /// Groq API key (env: GROQ_API_KEY)
    #[serde(default)]
    pub groq_api_key: Option<String>,
    /// Groq base URL
    pub groq_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Orchestration loop behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum automatic tool round-trips per request before the loop is
    /// forced to stop. Default: 5
    pub max_iterations: usize,
    /// Maximum artifacts resident in one conversation for ceiling-enforcing
    /// engines. Default: 50
    pub artifact_ceiling: usize,
    /// Stream retry attempts per turn. Default: 3
    pub max_retries: usize,
    /// Fixed delay between retries, in seconds. Default: 4
    pub retry_delay_secs: u64,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            artifact_ceiling: 50,
            max_retries: 3,
            retry_delay_secs: 4,
            debug: env::var("SCENECHAT_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Preview tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Root directory for per-invocation scratch directories
    pub scratch_dir: PathBuf,
    /// Keep every Nth rendered frame. Default: 4
    pub frame_stride: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scratch_dir: env::var("SCENECHAT_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("scenechat")),
            frame_stride: 4,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").ok(),
            groq_base_url: env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backends: BackendConfig::default(),
            agent: AgentConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scenechat")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(SceneChatError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| SceneChatError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SceneChatError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                SceneChatError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SceneChatError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| SceneChatError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.artifact_ceiling, 50);
        assert_eq!(config.agent.max_retries, 3);
        assert_eq!(config.agent.retry_delay_secs, 4);
        assert_eq!(config.preview.frame_stride, 4);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("max_iterations"));
        assert!(toml_str.contains("artifact_ceiling"));

        // What save() writes, load_from_file() must read back unchanged.
        let reloaded: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reloaded.agent.max_iterations, config.agent.max_iterations);
        assert_eq!(reloaded.preview.frame_stride, config.preview.frame_stride);
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("scenechat"));
    }
}
