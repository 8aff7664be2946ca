//! Per-step record.

use super::StepStatus;
use serde::{Deserialize, Serialize};

/// Status and error message for one step index.
///
/// `error` is empty unless the step failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Current status.
    pub status: StepStatus,
    /// Error message from the last failure, empty otherwise.
    #[serde(default)]
    pub error: String,
}

impl StepRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Returns true if the step carries an error message.
    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
