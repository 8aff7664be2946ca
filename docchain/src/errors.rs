//! Error types for docchain.
//!
//! Builder and step operations are total and never return errors. The
//! types here cover the surfaces around them: the external transformation
//! service and configuration loading.

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for docchain operations.
#[derive(Debug, Error)]
pub enum DocchainError {
    /// A transformation failed.
    #[error("{0}")]
    Transform(#[from] TransformError),

    /// Configuration was invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by (or on behalf of) the external transformation service.
///
/// The `Display` output is what ends up in a failed step's error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The service rejected the request.
    #[error("{reason}")]
    Rejected {
        /// The tool identifier.
        tool: String,
        /// The rejection message, verbatim.
        reason: String,
    },

    /// The service settled without producing any file.
    #[error("Tool '{tool}' produced no output")]
    NoOutput {
        /// The tool identifier.
        tool: String,
    },

    /// The step had no input to transform.
    #[error("No input available for step {step}")]
    MissingInput {
        /// The step index.
        step: usize,
    },

    /// No tool is configured at the step.
    #[error("No tool configured for step {step}")]
    UnknownStep {
        /// The step index.
        step: usize,
    },
}

impl TransformError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates a no-output error.
    #[must_use]
    pub fn no_output(tool: impl Into<String>) -> Self {
        Self::NoOutput { tool: tool.into() }
    }

    /// Creates a missing-input error.
    #[must_use]
    pub fn missing_input(step: usize) -> Self {
        Self::MissingInput { step }
    }

    /// Creates an unknown-step error.
    #[must_use]
    pub fn unknown_step(step: usize) -> Self {
        Self::UnknownStep { step }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Rejected { tool, reason } => {
                map.insert("type".to_string(), serde_json::json!("TransformRejected"));
                map.insert("tool".to_string(), serde_json::json!(tool));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::NoOutput { tool } => {
                map.insert("type".to_string(), serde_json::json!("TransformNoOutput"));
                map.insert("tool".to_string(), serde_json::json!(tool));
            }
            Self::MissingInput { step } => {
                map.insert("type".to_string(), serde_json::json!("TransformMissingInput"));
                map.insert("step".to_string(), serde_json::json!(step));
            }
            Self::UnknownStep { step } => {
                map.insert("type".to_string(), serde_json::json!("TransformUnknownStep"));
                map.insert("step".to_string(), serde_json::json!(step));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value outside its allowed range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid environment variable {name}={value}")]
    InvalidEnv {
        /// The variable name.
        name: String,
        /// The raw value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("Cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
