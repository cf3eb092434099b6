//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use redyce_extractor::{BackfillConfig, ExtractorConfig};
use redyce_llm::LlmConfig;
use redyce_scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "REDYCE_DATABASE";
/// Environment variable overriding the LLM endpoint
pub const ENV_LLM_ENDPOINT: &str = "REDYCE_LLM_ENDPOINT";
/// Environment variable overriding the LLM model
pub const ENV_LLM_MODEL: &str = "REDYCE_LLM_MODEL";

/// CLI configuration, one section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Completion provider
    #[serde(default)]
    pub llm: LlmConfig,

    /// Extraction job
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Backfill orchestrator
    #[serde(default)]
    pub backfill: BackfillConfig,

    /// Priority manager and job sweeper
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Database location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Config::home_dir()
                .map(|dir| dir.join("redyce.db"))
                .unwrap_or_else(|| PathBuf::from("redyce.db")),
        }
    }
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Directory holding the default config file and database.
    pub fn home_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".redyce"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Self::home_dir()
            .map(|dir| dir.join("config.toml"))
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default file is read if
    /// present, otherwise defaults are used. Environment overrides are
    /// applied last and the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::path() {
                Ok(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Apply environment overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DATABASE) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(endpoint) = lookup(ENV_LLM_ENDPOINT) {
            self.llm.endpoint = endpoint;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.llm.validate()?;
        self.extractor.validate()?;
        self.backfill.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.settings.color);
        assert_eq!(config.backfill.concurrency, 3);
        assert!(config.database.path.ends_with("redyce.db"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[database]
path = "/var/lib/redyce/redyce.db"

[llm]
model = "mistral"

[backfill]
concurrency = 5
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/var/lib/redyce/redyce.db"));
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
        assert_eq!(config.backfill.concurrency, 5);
        assert_eq!(config.extractor.min_text_length, 100);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[backfill]\nconcurrency = 0\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE, "/tmp/other.db"),
            (ENV_LLM_MODEL, "qwen2.5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.llm.model, "qwen2.5");
        assert_eq!(config.llm.endpoint, "http://localhost:11434");
    }
}
