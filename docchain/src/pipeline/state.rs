//! Per-step state machine.
//!
//! Step 0 is the input-acquisition phase; steps `1..=N` map one-to-one to
//! the tool list. Writes to steps outside `0..=N` are logged and ignored.

use crate::core::{StepRecord, StepStatus};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Status and error records indexed by step number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTable {
    records: Vec<StepRecord>,
}

impl StepTable {
    /// Creates a table with pending records for step 0 and steps `1..=steps`.
    #[must_use]
    pub fn with_steps(steps: usize) -> Self {
        Self {
            records: vec![StepRecord::pending(); steps + 1],
        }
    }

    /// Returns the number of tool steps, excluding step 0.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.records.len().saturating_sub(1)
    }

    /// Returns the record for `step`, or `None` if it was never written.
    #[must_use]
    pub fn record(&self, step: usize) -> Option<&StepRecord> {
        self.records.get(step)
    }

    /// Returns the status of `step`. Unknown steps are pending.
    #[must_use]
    pub fn status(&self, step: usize) -> StepStatus {
        self.records.get(step).map_or(StepStatus::Pending, |r| r.status)
    }

    /// Returns the error message of `step`, empty if none.
    #[must_use]
    pub fn error(&self, step: usize) -> &str {
        self.records.get(step).map_or("", |r| r.error.as_str())
    }

    fn record_mut(&mut self, step: usize) -> Option<&mut StepRecord> {
        let steps = self.step_count();
        let record = self.records.get_mut(step);
        if record.is_none() {
            warn!(step, steps, "Ignoring write to step outside the run");
        }
        record
    }

    fn set(&mut self, step: usize, status: StepStatus) -> Option<&mut StepRecord> {
        let record = self.record_mut(step)?;
        debug!(step, from = %record.status, to = %status, "Step transition");
        record.status = status;
        Some(record)
    }

    /// Promotes `step` to configuring if it is still pending.
    ///
    /// Returns true if the status changed.
    pub fn activate(&mut self, step: usize) -> bool {
        if self.status(step) != StepStatus::Pending {
            return false;
        }
        self.set(step, StepStatus::Configuring).is_some()
    }

    /// Forces `step` into configuring.
    pub fn configuring(&mut self, step: usize) {
        self.set(step, StepStatus::Configuring);
    }

    /// Forces `step` into processing.
    pub fn processing(&mut self, step: usize) {
        self.set(step, StepStatus::Processing);
    }

    /// Marks `step` done, dropping any earlier error.
    pub fn done(&mut self, step: usize) {
        if let Some(record) = self.set(step, StepStatus::Done) {
            record.error.clear();
        }
    }

    /// Marks `step` failed with `message`.
    pub fn failed(&mut self, step: usize, message: impl Into<String>) {
        if let Some(record) = self.set(step, StepStatus::Failed) {
            record.error = message.into();
        }
    }

    /// Marks `step` skipped, dropping any earlier error.
    pub fn skipped(&mut self, step: usize) {
        if let Some(record) = self.set(step, StepStatus::Skipped) {
            record.error.clear();
        }
    }

    /// Moves a failed step back to configuring and clears its error.
    ///
    /// Returns false, leaving the step untouched, unless it had failed.
    pub fn retry(&mut self, step: usize) -> bool {
        if !self.status(step).is_retryable() {
            return false;
        }
        if let Some(record) = self.set(step, StepStatus::Configuring) {
            record.error.clear();
        }
        true
    }

    /// Returns true if `step` is a tool step of this run (`1..=N`).
    #[must_use]
    pub fn is_tool_step(&self, step: usize) -> bool {
        (1..=self.step_count()).contains(&step)
    }

    /// Returns the first step in `1..step` that is neither done nor skipped.
    #[must_use]
    pub fn first_unsettled_before(&self, step: usize) -> Option<usize> {
        (1..step).find(|&k| !self.status(k).is_terminal())
    }

    /// Returns true if every step in `1..step` is done or skipped.
    #[must_use]
    pub fn settled_before(&self, step: usize) -> bool {
        self.first_unsettled_before(step).is_none()
    }

    /// Returns true if there is at least one tool step and all are done or skipped.
    #[must_use]
    pub fn all_settled(&self) -> bool {
        let steps = self.step_count();
        steps > 0 && self.settled_before(steps + 1)
    }

    /// Counts tool steps (excluding step 0) in `status`.
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.records.iter().skip(1).filter(|r| r.status == status).count()
    }

    /// Snapshot of every recorded status keyed by step.
    #[must_use]
    pub fn statuses(&self) -> BTreeMap<usize, StepStatus> {
        self.records.iter().map(|r| r.status).enumerate().collect()
    }

    /// Snapshot of non-empty error messages keyed by step.
    #[must_use]
    pub fn errors(&self) -> BTreeMap<usize, String> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.has_error())
            .map(|(k, r)| (k, r.error.clone()))
            .collect()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
