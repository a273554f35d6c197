//! PPA Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with defaults suitable for batch extraction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pattern::RuleDefinition;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Pattern matching and relation extraction
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(steps) = std::env::var("PPA_MAX_SEARCH_STEPS") {
            config.extractor.max_search_steps =
                steps.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PPA_MAX_SEARCH_STEPS".to_string(),
                    value: steps,
                })?;
        }

        // Comma-separated rule names
        if let Ok(rules) = std::env::var("PPA_DISABLED_RULES") {
            config.extractor.disabled_rules = rules
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        if env_config.extractor.max_search_steps != defaults.extractor.max_search_steps {
            self.extractor.max_search_steps = env_config.extractor.max_search_steps;
        }
        if !env_config.extractor.disabled_rules.is_empty() {
            self.extractor.disabled_rules = env_config.extractor.disabled_rules;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        Ok(self)
    }
}

/// Relation extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Candidate expansions allowed per pattern per sentence
    pub max_search_steps: usize,

    /// Built-in rule names to skip
    pub disabled_rules: Vec<String>,

    /// Additional rules compiled alongside the built-in battery
    pub custom_rules: Vec<RuleDefinition>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_search_steps: 100_000,
            disabled_rules: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
