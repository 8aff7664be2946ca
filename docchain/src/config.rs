//! Pipeline configuration.

use crate::buffers::DEFAULT_RETENTION_WINDOW;
use crate::errors::ConfigError;
use crate::validation::ValidationRules;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`PipelineConfig::max_tools`].
pub const ENV_MAX_TOOLS: &str = "DOCCHAIN_MAX_TOOLS";
/// Environment variable overriding [`PipelineConfig::retention_window`].
pub const ENV_RETENTION_WINDOW: &str = "DOCCHAIN_RETENTION_WINDOW";

/// Configuration for a pipeline session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of tools in a pipeline.
    #[serde(default = "default_max_tools")]
    pub max_tools: usize,
    /// Number of most recent step outputs kept in memory.
    #[serde(default = "default_retention_window")]
    pub retention_window: usize,
    /// Rules for the default validator.
    #[serde(default)]
    pub rules: ValidationRules,
}

fn default_max_tools() -> usize {
    5
}

fn default_retention_window() -> usize {
    DEFAULT_RETENTION_WINDOW
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_tools: default_max_tools(),
            retention_window: default_retention_window(),
            rules: ValidationRules::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tool capacity.
    #[must_use]
    pub fn with_max_tools(mut self, max_tools: usize) -> Self {
        self.max_tools = max_tools;
        self
    }

    /// Sets the retention window.
    #[must_use]
    pub fn with_retention_window(mut self, window: usize) -> Self {
        self.retention_window = window;
        self
    }

    /// Sets the validation rules.
    #[must_use]
    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parses and checks a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Builds a configuration from defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_TOOLS) {
            self.max_tools = parse_env(ENV_MAX_TOOLS, &value)?;
        }
        if let Some(value) = lookup(ENV_RETENTION_WINDOW) {
            self.retention_window = parse_env(ENV_RETENTION_WINDOW, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tools == 0 {
            return Err(ConfigError::invalid_value("max_tools", "must be at least 1"));
        }
        if self.retention_window == 0 {
            return Err(ConfigError::invalid_value(
                "retention_window",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn parse_env(name: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_tools, 5);
        assert_eq!(config.retention_window, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PipelineConfig::from_json_str(r#"{"max_tools": 3}"#).unwrap();
        assert_eq!(config.max_tools, 3);
        assert_eq!(config.retention_window, 2);
        assert_eq!(config.rules, ValidationRules::default());
    }

    #[test]
    fn test_from_json_rejects_zero() {
        let err = PipelineConfig::from_json_str(r#"{"retention_window": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = PipelineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            [(ENV_MAX_TOOLS, "4"), (ENV_RETENTION_WINDOW, " 3 ")].into_iter().collect();
        let config = PipelineConfig::default()
            .with_env_overrides(|name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.max_tools, 4);
        assert_eq!(config.retention_window, 3);
    }

    #[test]
    fn test_env_override_invalid() {
        let err = PipelineConfig::default()
            .with_env_overrides(|name| (name == ENV_MAX_TOOLS).then(|| "five".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DOCCHAIN_MAX_TOOLS=five"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_tools": 2, "rules": {{"terminal_tools": ["sign"]}}}}"#).unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_tools, 2);
        assert_eq!(config.rules.terminal_tools, vec!["sign".to_string()]);
    }
}
