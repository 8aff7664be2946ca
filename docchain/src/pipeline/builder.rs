//! Builder-phase operations on the tool list.
//!
//! Every mutation ends with a full revalidation of the resulting list.

use super::{PipelineSession, Preset};
use tracing::{debug, info, warn};

impl PipelineSession {
    /// Appends `tool` unless the list is full.
    ///
    /// A rejected tool is dropped silently. Returns whether it was added.
    pub fn add_tool(&mut self, tool: impl Into<String>) -> bool {
        let tool = tool.into();
        if self.selected_tools.len() >= self.config.max_tools {
            warn!(tool = %tool, max = self.config.max_tools, "Pipeline full, tool not added");
            self.emit("builder.tool_rejected", serde_json::json!({ "tool": tool }));
            return false;
        }
        debug!(tool = %tool, position = self.selected_tools.len(), "Adding tool");
        self.selected_tools.push(tool);
        self.revalidate();
        true
    }

    /// Removes the tool at `index` (0-based). Out-of-range indices change nothing.
    pub fn remove_tool(&mut self, index: usize) -> Option<String> {
        let removed = (index < self.selected_tools.len()).then(|| self.selected_tools.remove(index));
        debug!(index, removed = ?removed, "Removing tool");
        self.revalidate();
        removed
    }

    /// Moves the tool at `from` to position `to`, shifting the others.
    ///
    /// `to` past the end moves the tool to the back.
    pub fn reorder_tools(&mut self, from: usize, to: usize) {
        if from < self.selected_tools.len() {
            let tool = self.selected_tools.remove(from);
            let to = to.min(self.selected_tools.len());
            debug!(tool = %tool, from, to, "Reordering tool");
            self.selected_tools.insert(to, tool);
        }
        self.revalidate();
    }

    /// Replaces the tool list with the preset's, truncated to capacity.
    pub fn load_preset(&mut self, preset: &Preset) {
        if preset.tools.len() > self.config.max_tools {
            warn!(
                preset = %preset.id,
                tools = preset.tools.len(),
                max = self.config.max_tools,
                "Preset truncated"
            );
        }
        self.selected_tools = preset
            .tools
            .iter()
            .take(self.config.max_tools)
            .cloned()
            .collect();
        info!(preset = %preset.id, tools = ?self.selected_tools, "Loaded preset");
        self.revalidate();
    }

    /// Empties the tool list and drops all execution state, including the input.
    pub fn clear_pipeline(&mut self) {
        self.selected_tools.clear();
        self.current_step = None;
        self.is_executing = false;
        self.steps.clear();
        self.buffers.clear();
        self.run_id = None;
        info!("Pipeline cleared");
        self.emit("pipeline.cleared", serde_json::json!({}));
        self.revalidate();
    }

    fn revalidate(&mut self) {
        self.validation = self.validator.validate(&self.selected_tools);
        self.emit(
            "validation.updated",
            serde_json::json!({
                "tools": self.selected_tools,
                "valid": self.validation.valid,
                "warnings": self.validation.warnings,
            }),
        );
    }
}
