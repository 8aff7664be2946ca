//! Pipeline session state.
//!
//! A [`PipelineSession`] owns everything about one pipeline: the tool list
//! and its validation verdict (builder phase), plus step records, buffers
//! and the current step pointer (execution phase). Builder operations live
//! in `builder.rs`, execution operations in `controller.rs`.

use super::StepTable;
use crate::buffers::IntermediateBuffers;
use crate::config::PipelineConfig;
use crate::core::{Payload, StepStatus};
use crate::events::{EventSink, NoOpEventSink};
use crate::utils::iso_timestamp;
use crate::validation::{RuleValidator, ValidationResult, Validator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Step counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Number of tool steps.
    pub total: usize,
    /// Steps done.
    pub done: usize,
    /// Steps skipped.
    pub skipped: usize,
    /// Steps failed.
    pub failed: usize,
}

impl Progress {
    /// Fraction of steps that are done or skipped.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done + self.skipped) as f64 / self.total as f64
    }
}

/// One pipeline: builder state plus execution state.
pub struct PipelineSession {
    pub(super) config: PipelineConfig,
    pub(super) validator: Arc<dyn Validator>,
    pub(super) events: Arc<dyn EventSink>,
    pub(super) selected_tools: Vec<String>,
    pub(super) validation: ValidationResult,
    pub(super) steps: StepTable,
    pub(super) buffers: IntermediateBuffers,
    pub(super) current_step: Option<usize>,
    pub(super) is_executing: bool,
    pub(super) run_id: Option<Uuid>,
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl fmt::Debug for PipelineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSession")
            .field("selected_tools", &self.selected_tools)
            .field("current_step", &self.current_step)
            .field("is_executing", &self.is_executing)
            .field("run_id", &self.run_id)
            .field("steps", &self.steps)
            .field("retained_steps", &self.buffers.retained_steps())
            .finish_non_exhaustive()
    }
}

impl PipelineSession {
    /// Creates a session using the default rule validator for `config.rules`.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let validator: Arc<dyn Validator> = Arc::new(RuleValidator::new(config.rules.clone()));
        let validation = validator.validate(&[]);
        let buffers = IntermediateBuffers::new(config.retention_window);
        Self {
            config,
            validator,
            events: Arc::new(NoOpEventSink),
            selected_tools: Vec::new(),
            validation,
            steps: StepTable::default(),
            buffers,
            current_step: None,
            is_executing: false,
            run_id: None,
        }
    }

    /// Replaces the validator and revalidates the current tool list.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self.validation = self.validator.validate(&self.selected_tools);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns a handle to the event sink.
    #[must_use]
    pub fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }

    pub(super) fn emit(&self, event_type: &str, mut data: serde_json::Value) {
        if let serde_json::Value::Object(ref mut map) = data {
            map.insert("run_id".to_string(), serde_json::json!(self.run_id.map(|id| id.to_string())));
            map.insert("timestamp".to_string(), serde_json::json!(iso_timestamp()));
        }
        self.events.try_emit(event_type, Some(data));
    }

    /// The ordered tool list.
    #[must_use]
    pub fn selected_tools(&self) -> &[String] {
        &self.selected_tools
    }

    /// The tool at 1-indexed `step`.
    #[must_use]
    pub fn tool_at(&self, step: usize) -> Option<&str> {
        step.checked_sub(1)
            .and_then(|i| self.selected_tools.get(i))
            .map(String::as_str)
    }

    /// The current validation verdict.
    #[must_use]
    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// The step pointer. `None` is the builder phase, `Some(0)` awaits input.
    #[must_use]
    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.is_executing
    }

    /// Identifier of the current run, assigned by `start_pipeline`.
    #[must_use]
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Number of tool steps in the current run.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.step_count()
    }

    /// Status of `step`. Steps never written read as pending.
    #[must_use]
    pub fn step_status(&self, step: usize) -> StepStatus {
        self.steps.status(step)
    }

    /// Error message of `step`, empty unless it failed.
    #[must_use]
    pub fn step_error(&self, step: usize) -> &str {
        self.steps.error(step)
    }

    /// Snapshot of every step status, including step 0.
    #[must_use]
    pub fn step_statuses(&self) -> BTreeMap<usize, StepStatus> {
        self.steps.statuses()
    }

    /// Snapshot of step error messages.
    #[must_use]
    pub fn step_errors(&self) -> BTreeMap<usize, String> {
        self.steps.errors()
    }

    /// The retained intermediate results.
    #[must_use]
    pub fn intermediate_results(&self) -> &BTreeMap<usize, Payload> {
        self.buffers.results()
    }

    /// The retained output of `step`.
    #[must_use]
    pub fn intermediate_result(&self, step: usize) -> Option<&Payload> {
        self.buffers.get(step)
    }

    /// The original input.
    #[must_use]
    pub fn original_input(&self) -> Option<&Payload> {
        self.buffers.original()
    }

    /// Whether every step before `step` is done or skipped.
    #[must_use]
    pub fn can_advance_to(&self, step: usize) -> bool {
        self.steps.settled_before(step)
    }

    /// The first step before `step` that still needs to finish, be retried or be skipped.
    #[must_use]
    pub fn blocking_step(&self, step: usize) -> Option<usize> {
        self.steps.first_unsettled_before(step)
    }

    /// Whether every tool step is done or skipped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.steps.all_settled()
    }

    /// The final artifact, once every step is done or skipped.
    #[must_use]
    pub fn final_output(&self) -> Option<&Payload> {
        if self.is_finished() {
            self.buffers.last_output()
        } else {
            None
        }
    }

    /// Step counts for the current run.
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            total: self.steps.step_count(),
            done: self.steps.count(StepStatus::Done),
            skipped: self.steps.count(StepStatus::Skipped),
            failed: self.steps.count(StepStatus::Failed),
        }
    }
}
