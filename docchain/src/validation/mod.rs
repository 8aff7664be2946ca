//! Validation of tool orderings.
//!
//! A [`Validator`] maps an ordered list of tool identifiers to a
//! [`ValidationResult`]. The pipeline session recomputes the result after
//! every tool list mutation; there is no incremental validation.

mod rules;

pub use rules::{RuleValidator, ToolPair, ValidationRules};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Blocks the pipeline from starting.
    Error,
    /// Likely mistake, does not block.
    Warning,
    /// Optional improvement.
    Suggestion,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Suggestion => write!(f, "suggestion"),
        }
    }
}

/// A single finding produced by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Severity.
    #[serde(rename = "type")]
    pub kind: WarningKind,
    /// Human readable explanation.
    pub message: String,
}

impl ValidationWarning {
    /// Creates a blocking error.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Error,
            message: message.into(),
        }
    }

    /// Creates a non-blocking warning.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Warning,
            message: message.into(),
        }
    }

    /// Creates a suggestion.
    #[must_use]
    pub fn suggestion(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Suggestion,
            message: message.into(),
        }
    }
}

/// Verdict for a tool list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the pipeline may start.
    pub valid: bool,
    /// Findings in the order they were produced.
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Builds a result from findings. Any error makes it invalid.
    #[must_use]
    pub fn from_warnings(warnings: Vec<ValidationWarning>) -> Self {
        let valid = !warnings.iter().any(|w| w.kind == WarningKind::Error);
        Self { valid, warnings }
    }

    /// Returns true if any finding blocks execution.
    #[must_use]
    pub fn has_blocking_errors(&self) -> bool {
        !self.valid
    }

    /// Returns the blocking findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(|w| w.kind == WarningKind::Error)
    }

    /// Counts findings of the given kind.
    #[must_use]
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// Computes a verdict for an ordered tool list.
pub trait Validator: Send + Sync {
    /// Validates the tool list.
    fn validate(&self, tools: &[String]) -> ValidationResult;
}
