//! Configuration for the extraction job and the backfill orchestrator

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for [`crate::RequirementExtractor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum extracted text length (characters); shorter documents fail
    pub min_text_length: usize,

    /// Longest text sent to the model as-is (characters)
    pub max_text_length: usize,

    /// Characters kept from the start of an over-long text
    pub head_chars: usize,

    /// Characters kept from the end of an over-long text
    pub tail_chars: usize,

    /// Model override; `None` uses the provider default
    pub model: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Cap on generated tokens
    pub max_tokens: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            max_text_length: 60_000,
            head_chars: 40_000,
            tail_chars: 20_000,
            model: None,
            temperature: 0.1,
            max_tokens: 4096,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: small window for fast, cheap models
    pub fn aggressive() -> Self {
        Self {
            min_text_length: 100,
            max_text_length: 20_000,
            head_chars: 14_000,
            tail_chars: 6_000,
            model: None,
            temperature: 0.0,
            max_tokens: 2048,
        }
    }

    /// Lenient preset: large window for long-context models
    pub fn lenient() -> Self {
        Self {
            min_text_length: 50,
            max_text_length: 150_000,
            head_chars: 100_000,
            tail_chars: 50_000,
            model: None,
            temperature: 0.2,
            max_tokens: 8192,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_text_length == 0 {
            return Err(ExtractorError::Config(
                "max_text_length must be greater than 0".to_string(),
            ));
        }
        if self.min_text_length > self.max_text_length {
            return Err(ExtractorError::Config(
                "min_text_length cannot exceed max_text_length".to_string(),
            ));
        }
        if self.head_chars + self.tail_chars > self.max_text_length {
            return Err(ExtractorError::Config(
                "head_chars + tail_chars cannot exceed max_text_length".to_string(),
            ));
        }
        if self.head_chars == 0 {
            return Err(ExtractorError::Config(
                "head_chars must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ExtractorError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ExtractorError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

/// Configuration for [`crate::BackfillOrchestrator`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Documents extracted concurrently within a batch
    pub concurrency: usize,

    /// Pause between background batches (milliseconds)
    pub batch_delay_ms: u64,

    /// User that backfill usage is attributed to
    pub user_id: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            batch_delay_ms: 0,
            user_id: "system".to_string(),
        }
    }
}

impl BackfillConfig {
    /// Get the inter-batch delay as a Duration
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.concurrency == 0 {
            return Err(ExtractorError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(ExtractorError::Config(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_text_length, 100);
        assert_eq!(config.max_text_length, 60_000);
        assert_eq!(config.head_chars + config.tail_chars, 60_000);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_window_larger_than_max_rejected() {
        let config = ExtractorConfig {
            head_chars: 50_000,
            ..ExtractorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let config = ExtractorConfig {
            min_text_length: 70_000,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig {
            model: Some("mistral".to_string()),
            ..ExtractorConfig::default()
        };
        let parsed = ExtractorConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_backfill_defaults() {
        let config = BackfillConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.batch_delay(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backfill_zero_concurrency_rejected() {
        let config = BackfillConfig::from_toml("concurrency = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
