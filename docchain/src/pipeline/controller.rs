//! Execution-phase operations.
//!
//! None of these operations return errors. Failures reported by the
//! transformation service arrive through [`PipelineSession::fail_step`].

use super::{PipelineSession, StepTable};
use crate::core::Payload;
use crate::utils::generate_run_id;
use tracing::{debug, info, warn};

impl PipelineSession {
    /// Starts a run over the current tool list.
    ///
    /// Step records and retained outputs from an earlier run are dropped;
    /// the original input is kept.
    ///
    /// Validity is not re-checked here; callers gate on
    /// [`validation`](Self::validation) before offering a start. An empty
    /// tool list starts nothing and returns false.
    pub fn start_pipeline(&mut self) -> bool {
        if self.selected_tools.is_empty() {
            warn!("Cannot start an empty pipeline");
            return false;
        }
        let run_id = generate_run_id();
        self.steps = StepTable::with_steps(self.selected_tools.len());
        self.buffers.clear_results();
        self.current_step = Some(0);
        self.is_executing = true;
        self.run_id = Some(run_id);
        info!(run_id = %run_id, tools = ?self.selected_tools, "Pipeline started");
        self.emit(
            "pipeline.started",
            serde_json::json!({ "tools": self.selected_tools }),
        );
        true
    }

    /// Records the document the first step consumes.
    pub fn set_original_input(&mut self, input: Payload) {
        debug!(name = input.name(), len = input.len(), "Original input set");
        self.buffers.set_original(input);
    }

    /// Moves the pointer to `step`, promoting it to configuring if pending.
    pub fn advance_to_step(&mut self, step: usize) {
        self.current_step = Some(step);
        if self.steps.activate(step) {
            self.emit("step.configuring", serde_json::json!({ "step": step }));
        }
        debug!(step, status = %self.steps.status(step), "Advanced to step");
    }

    /// Forces `step` into configuring.
    pub fn set_step_configuring(&mut self, step: usize) {
        self.steps.configuring(step);
        self.emit("step.configuring", serde_json::json!({ "step": step }));
    }

    /// Forces `step` into processing. The caller has already checked for an input.
    pub fn set_step_processing(&mut self, step: usize) {
        self.steps.processing(step);
        self.emit(
            "step.processing",
            serde_json::json!({ "step": step, "tool": self.tool_at(step) }),
        );
    }

    /// Marks `step` done and stores its output, evicting older outputs.
    ///
    /// Only tool steps `1..=N` produce outputs; anything else is ignored.
    pub fn complete_step(&mut self, step: usize, output: Payload) {
        if !self.steps.is_tool_step(step) {
            warn!(step, steps = self.steps.step_count(), "Ignoring completion of a non-tool step");
            return;
        }
        let len = output.len();
        self.steps.done(step);
        self.buffers.store(step, output);
        info!(step, tool = ?self.tool_at(step), len, "Step completed");
        self.emit(
            "step.completed",
            serde_json::json!({ "step": step, "tool": self.tool_at(step), "bytes": len }),
        );
    }

    /// Marks `step` failed with `message`.
    pub fn fail_step(&mut self, step: usize, message: impl Into<String>) {
        let message = message.into();
        warn!(step, tool = ?self.tool_at(step), error = %message, "Step failed");
        self.emit(
            "step.failed",
            serde_json::json!({ "step": step, "tool": self.tool_at(step), "error": message }),
        );
        self.steps.failed(step, message);
    }

    /// Skips `step`, passing its input through as its output.
    ///
    /// Only tool steps `1..=N` can be skipped; anything else is ignored.
    pub fn skip_step(&mut self, step: usize) {
        if !self.steps.is_tool_step(step) {
            warn!(step, steps = self.steps.step_count(), "Ignoring skip of a non-tool step");
            return;
        }
        let input = self.buffers.input_for(step).cloned();
        self.steps.skipped(step);
        match input {
            Some(input) => self.buffers.store(step, input),
            None => warn!(step, "Skipped step has no input to pass through"),
        }
        info!(step, tool = ?self.tool_at(step), "Step skipped");
        self.emit("step.skipped", serde_json::json!({ "step": step }));
    }

    /// Moves a failed step back to configuring and clears its error.
    ///
    /// Returns false and changes nothing unless the step had failed.
    pub fn retry_step(&mut self, step: usize) -> bool {
        if !self.steps.retry(step) {
            debug!(step, status = %self.steps.status(step), "Retry ignored");
            return false;
        }
        info!(step, "Step retried");
        self.emit("step.retried", serde_json::json!({ "step": step }));
        true
    }

    /// Stops driving the run. Step records and outputs stay for inspection.
    pub fn cancel_pipeline(&mut self) {
        info!(run_id = ?self.run_id, current_step = ?self.current_step, "Pipeline cancelled");
        self.emit("pipeline.cancelled", serde_json::json!({ "step": self.current_step }));
        self.current_step = None;
        self.is_executing = false;
        self.run_id = None;
    }

    /// Like cancel, but also clears step records and retained outputs.
    ///
    /// The tool list, validation verdict and original input are kept for a rerun.
    pub fn reset_pipeline(&mut self) {
        info!(run_id = ?self.run_id, "Pipeline reset");
        self.emit("pipeline.reset", serde_json::json!({}));
        self.current_step = None;
        self.is_executing = false;
        self.run_id = None;
        self.steps.clear();
        self.buffers.clear_results();
    }

    /// The payload `step` consumes.
    #[must_use]
    pub fn get_step_input(&self, step: usize) -> Option<&Payload> {
        self.buffers.input_for(step)
    }

    /// The highest-numbered retained output, or the original input.
    #[must_use]
    pub fn get_last_successful_output(&self) -> Option<&Payload> {
        self.buffers.last_output()
    }
}
