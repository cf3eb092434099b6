//! Configuration for LLM providers

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default timeout for LLM requests (seconds)
///
/// Requirement extraction sends up to 60 000 characters of document text,
/// so this is well above a chat-style timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for the completion provider
///
/// # Examples
///
/// ```
/// use redyce_llm::LlmConfig;
///
/// let config = LlmConfig::from_toml("model = \"mistral\"").unwrap();
/// assert_eq!(config.model, "mistral");
/// assert_eq!(config.endpoint, "http://localhost:11434");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider endpoint
    pub endpoint: String,

    /// Model used when a call does not override it
    pub model: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Attempts per request on transport or server errors
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.endpoint.trim().is_empty() {
            return Err(LlmError::Config("endpoint must not be empty".to_string()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(LlmError::Config(format!(
                "endpoint must be an http(s) URL, got {}",
                self.endpoint
            )));
        }
        if self.model.trim().is_empty() {
            return Err(LlmError::Config("model must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LlmError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(LlmError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, LlmError> {
        toml::from_str(toml_str)
            .map_err(|e| LlmError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, LlmError> {
        toml::to_string_pretty(self)
            .map_err(|e| LlmError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
