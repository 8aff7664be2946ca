//! Wall-clock timing for step execution.

use std::time::{Duration, Instant};

/// Measures how long a step spends inside the transformation service.
#[derive(Debug, Clone)]
pub struct StepTimer {
    step: usize,
    start: Instant,
}

impl StepTimer {
    /// Starts timing `step`.
    #[must_use]
    pub fn start(step: usize) -> Self {
        Self {
            step,
            start: Instant::now(),
        }
    }

    /// The timed step.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Elapsed time so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed milliseconds, truncated.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
