//! Read-only catalogue of tool display metadata.
//!
//! The pipeline core never checks tool ids against the registry. It is
//! consulted by callers for labels and duration estimates only.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Display metadata for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// The tool identifier.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// Icon reference understood by the host UI.
    #[serde(default)]
    pub icon_ref: Option<String>,
    /// Fixed cost per run in milliseconds.
    #[serde(default)]
    pub base_ms: u64,
    /// Additional cost per megabyte of input in milliseconds.
    #[serde(default)]
    pub ms_per_mb: u64,
}

impl ToolMetadata {
    /// Creates metadata with no cost estimate.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon_ref: None,
            base_ms: 0,
            ms_per_mb: 0,
        }
    }

    /// Sets the icon reference.
    #[must_use]
    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }

    /// Sets the cost model.
    #[must_use]
    pub fn with_cost(mut self, base_ms: u64, ms_per_mb: u64) -> Self {
        self.base_ms = base_ms;
        self.ms_per_mb = ms_per_mb;
        self
    }

    /// Estimates how long the tool takes on `input_bytes` of input.
    #[must_use]
    pub fn estimate_time(&self, input_bytes: usize) -> Duration {
        let megabytes = input_bytes.div_ceil(1024 * 1024) as u64;
        Duration::from_millis(self.base_ms.saturating_add(self.ms_per_mb.saturating_mul(megabytes)))
    }
}

/// Registry of tool metadata keyed by id.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, ToolMetadata>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a tool.
    pub fn register(&self, metadata: ToolMetadata) {
        self.tools.write().insert(metadata.id.clone(), metadata);
    }

    /// Returns the metadata for `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ToolMetadata> {
        self.tools.read().get(id).cloned()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.tools.read().contains_key(id)
    }

    /// Returns the display name for `id`, falling back to the id itself.
    #[must_use]
    pub fn display_name(&self, id: &str) -> String {
        self.tools
            .read()
            .get(id)
            .map_or_else(|| id.to_string(), |t| t.name.clone())
    }

    /// Sums the estimates for a chain. Unknown tools contribute nothing.
    #[must_use]
    pub fn estimate_pipeline(&self, tools: &[String], input_bytes: usize) -> Duration {
        let registered = self.tools.read();
        tools
            .iter()
            .filter_map(|id| registered.get(id))
            .map(|t| t.estimate_time(input_bytes))
            .sum()
    }

    /// Lists registered ids, sorted.
    #[must_use]
    pub fn list_tools(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tools.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Clears all registered tools.
    pub fn clear(&self) {
        self.tools.write().clear();
    }
}
