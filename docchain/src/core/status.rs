//! Step status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle status of a single pipeline step.
///
/// A step with no recorded status is treated as [`StepStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not been reached yet.
    #[default]
    Pending,
    /// Step is being configured by the user.
    Configuring,
    /// Step's transformation is in flight.
    Processing,
    /// Step produced an output.
    Done,
    /// Step's transformation was rejected.
    Failed,
    /// Step was skipped and passes its input through.
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Configuring => write!(f, "configuring"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl StepStatus {
    /// Returns true if no transition leads out of this status short of a reset.
    ///
    /// Downstream steps may only consume the output of a terminal step.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped)
    }

    /// Returns true if the step can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed)
    }
}
