//! Bounded retention of intermediate step outputs.
//!
//! Each payload may be tens of megabytes, so only the most recent
//! `window` step outputs are kept. The original input lives outside the
//! evictable map and is never dropped by the policy.

use crate::core::Payload;
use std::collections::BTreeMap;
use tracing::debug;

/// Default number of retained step outputs.
pub const DEFAULT_RETENTION_WINDOW: usize = 2;

/// Stores the original input and a sliding window of step outputs.
#[derive(Debug, Clone)]
pub struct IntermediateBuffers {
    original: Option<Payload>,
    results: BTreeMap<usize, Payload>,
    window: usize,
}

impl Default for IntermediateBuffers {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_WINDOW)
    }
}

impl IntermediateBuffers {
    /// Creates empty buffers retaining `window` outputs (at least one).
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            original: None,
            results: BTreeMap::new(),
            window: window.max(1),
        }
    }

    /// Returns the retention window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Sets the original input.
    pub fn set_original(&mut self, input: Payload) {
        self.original = Some(input);
    }

    /// Returns the original input.
    #[must_use]
    pub fn original(&self) -> Option<&Payload> {
        self.original.as_ref()
    }

    /// Stores the output of step `step`, evicting outputs that fall out of the window.
    ///
    /// With the default window of two, every entry below `step - 1` is removed.
    pub fn store(&mut self, step: usize, output: Payload) {
        self.evict_before(step);
        self.results.insert(step, output);
    }

    fn evict_before(&mut self, step: usize) {
        let Some(keep_from) = step.checked_sub(self.window - 1) else {
            return;
        };
        let before = self.results.len();
        self.results = self.results.split_off(&keep_from);
        let evicted = before - self.results.len();
        if evicted > 0 {
            debug!(step, keep_from, evicted, "Evicted intermediate results");
        }
    }

    /// Returns the stored output of `step`, if still retained.
    #[must_use]
    pub fn get(&self, step: usize) -> Option<&Payload> {
        self.results.get(&step)
    }

    /// Returns the input for `step`.
    ///
    /// Steps 0 and 1 read the original input. Later steps read the closest
    /// retained output below them, falling back to the original input.
    #[must_use]
    pub fn input_for(&self, step: usize) -> Option<&Payload> {
        if step <= 1 {
            return self.original.as_ref();
        }
        self.results
            .range(1..step)
            .next_back()
            .map(|(_, payload)| payload)
            .or(self.original.as_ref())
    }

    /// Returns the output with the highest step index, or the original input.
    #[must_use]
    pub fn last_output(&self) -> Option<&Payload> {
        self.results
            .values()
            .next_back()
            .or(self.original.as_ref())
    }

    /// Returns the indices of retained outputs in ascending order.
    #[must_use]
    pub fn retained_steps(&self) -> Vec<usize> {
        self.results.keys().copied().collect()
    }

    /// Returns a snapshot of the retained outputs.
    #[must_use]
    pub fn results(&self) -> &BTreeMap<usize, Payload> {
        &self.results
    }

    /// Total bytes held, including the original input.
    #[must_use]
    pub fn retained_bytes(&self) -> usize {
        let original = self.original.as_ref().map_or(0, Payload::len);
        original + self.results.values().map(Payload::len).sum::<usize>()
    }

    /// Drops all step outputs but keeps the original input.
    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Drops everything, including the original input.
    pub fn clear(&mut self) {
        self.results.clear();
        self.original = None;
    }
}
