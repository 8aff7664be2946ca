//! Installs a `tracing` subscriber for hosts that do not bring their own.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

fn default_directive() -> String {
    "docchain=info".to_string()
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_directive")]
    pub directive: String,
    /// Whether to print span targets.
    #[serde(default)]
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            directive: default_directive(),
            with_target: false,
        }
    }
}

impl TracingConfig {
    /// Sets the line format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the fallback filter directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directive = directive.into();
        self
    }

    /// Builds the filter, preferring `RUST_LOG` when set.
    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.directive)
            .map_err(|e| ConfigError::invalid_value("directive", e.to_string()))
    }
}

/// Installs a global subscriber.
///
/// Returns `Ok(false)` if another subscriber was already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<bool, ConfigError> {
    let filter = config.filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.directive, "docchain=info");
    }

    #[test]
    fn test_config_from_json() {
        let config: TracingConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directive, "docchain=info");
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        let config = TracingConfig::default().with_format(LogFormat::Json);
        let _ = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }
}
