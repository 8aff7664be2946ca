//! Table-driven default validator.

use super::{ValidationResult, ValidationWarning, Validator};
use serde::{Deserialize, Serialize};

/// An ordered pair of tools that conflict when `then` follows `first`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPair {
    /// The earlier tool.
    pub first: String,
    /// The later tool.
    pub then: String,
    /// Optional custom message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ToolPair {
    /// Creates a new pair.
    #[must_use]
    pub fn new(first: impl Into<String>, then: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            then: then.into(),
            message: None,
        }
    }

    /// Sets a custom message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Rule tables for [`RuleValidator`]. Tool ids are compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Tools whose output no other tool can read. Anything after one is an error.
    #[serde(default = "default_terminal_tools")]
    pub terminal_tools: Vec<String>,
    /// Pairs flagged with a warning when `then` appears after `first`.
    #[serde(default = "default_exclusive_pairs")]
    pub exclusive_pairs: Vec<ToolPair>,
    /// Tools that should be the final step.
    #[serde(default = "default_preferred_last")]
    pub preferred_last: Vec<String>,
    /// Whether to suggest merging consecutive identical steps.
    #[serde(default = "default_flag_duplicates")]
    pub flag_consecutive_duplicates: bool,
}

fn default_terminal_tools() -> Vec<String> {
    vec!["encrypt".to_string()]
}

fn default_exclusive_pairs() -> Vec<ToolPair> {
    vec![ToolPair::new("split", "merge")]
}

fn default_preferred_last() -> Vec<String> {
    vec!["compress".to_string()]
}

fn default_flag_duplicates() -> bool {
    true
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            terminal_tools: default_terminal_tools(),
            exclusive_pairs: default_exclusive_pairs(),
            preferred_last: default_preferred_last(),
            flag_consecutive_duplicates: default_flag_duplicates(),
        }
    }
}

impl ValidationRules {
    /// Creates rules with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            terminal_tools: Vec::new(),
            exclusive_pairs: Vec::new(),
            preferred_last: Vec::new(),
            flag_consecutive_duplicates: false,
        }
    }

    /// Adds a terminal tool.
    #[must_use]
    pub fn with_terminal_tool(mut self, tool: impl Into<String>) -> Self {
        self.terminal_tools.push(tool.into());
        self
    }

    /// Adds an exclusive pair.
    #[must_use]
    pub fn with_exclusive_pair(mut self, pair: ToolPair) -> Self {
        self.exclusive_pairs.push(pair);
        self
    }

    /// Adds a tool that should come last.
    #[must_use]
    pub fn with_preferred_last(mut self, tool: impl Into<String>) -> Self {
        self.preferred_last.push(tool.into());
        self
    }
}

/// Default [`Validator`] driven by [`ValidationRules`].
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: ValidationRules,
}

impl RuleValidator {
    /// Creates a validator with the given rules.
    #[must_use]
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    /// Returns the rule tables.
    #[must_use]
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    fn check_terminal(&self, tools: &[String], out: &mut Vec<ValidationWarning>) {
        for (i, tool) in tools.iter().enumerate() {
            let rest = &tools[i + 1..];
            if rest.is_empty() || !self.rules.terminal_tools.contains(tool) {
                continue;
            }
            out.push(ValidationWarning::error(format!(
                "'{tool}' must be the last step: {} cannot read its output",
                rest.join(", ")
            )));
        }
    }

    fn check_pairs(&self, tools: &[String], out: &mut Vec<ValidationWarning>) {
        for pair in &self.rules.exclusive_pairs {
            let Some(first_at) = tools.iter().position(|t| *t == pair.first) else {
                continue;
            };
            if tools[first_at + 1..].iter().any(|t| *t == pair.then) {
                let message = pair.message.clone().unwrap_or_else(|| {
                    format!("'{}' after '{}' undoes its effect", pair.then, pair.first)
                });
                out.push(ValidationWarning::warning(message));
            }
        }
    }

    fn check_preferred_last(&self, tools: &[String], out: &mut Vec<ValidationWarning>) {
        let Some((_, init)) = tools.split_last() else {
            return;
        };
        for tool in init {
            if self.rules.preferred_last.contains(tool) {
                out.push(ValidationWarning::suggestion(format!(
                    "'{tool}' works best as the final step"
                )));
            }
        }
    }

    fn check_duplicates(&self, tools: &[String], out: &mut Vec<ValidationWarning>) {
        if !self.rules.flag_consecutive_duplicates {
            return;
        }
        for window in tools.windows(2) {
            if window[0] == window[1] {
                out.push(ValidationWarning::suggestion(format!(
                    "Consecutive '{}' steps could be combined into one",
                    window[0]
                )));
            }
        }
    }
}

impl Validator for RuleValidator {
    fn validate(&self, tools: &[String]) -> ValidationResult {
        let mut warnings = Vec::new();
        self.check_terminal(tools, &mut warnings);
        self.check_pairs(tools, &mut warnings);
        self.check_preferred_last(tools, &mut warnings);
        self.check_duplicates(tools, &mut warnings);
        ValidationResult::from_warnings(warnings)
    }
}
