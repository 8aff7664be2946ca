//! Scripted transformation service for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::core::Payload;
use crate::errors::TransformError;
use crate::tools::{OutputFile, StepOptions, TransformOutput, TransformService};

/// A transformation service that appends `|<tool>` to its input bytes.
///
/// Failures can be queued per tool; each queued failure is consumed by
/// one call. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedTransformService {
    failures: Mutex<HashMap<String, VecDeque<String>>>,
    calls: Mutex<Vec<String>>,
    options: Mutex<Vec<StepOptions>>,
    delay: Option<Duration>,
}

impl ScriptedTransformService {
    /// Creates a service that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a failure for the next call to `tool`.
    #[must_use]
    pub fn fail_next(self, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures
            .lock()
            .entry(tool.into())
            .or_default()
            .push_back(reason.into());
        self
    }

    /// Sleeps for `delay` before settling each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Tool ids in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Options passed with each call.
    #[must_use]
    pub fn recorded_options(&self) -> Vec<StepOptions> {
        self.options.lock().clone()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl TransformService for ScriptedTransformService {
    async fn transform(
        &self,
        tool_id: &str,
        inputs: Vec<Payload>,
        options: &StepOptions,
    ) -> Result<TransformOutput, TransformError> {
        self.calls.lock().push(tool_id.to_string());
        self.options.lock().push(options.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .get_mut(tool_id)
            .and_then(VecDeque::pop_front);
        if let Some(reason) = failure {
            return Err(TransformError::rejected(tool_id, reason));
        }

        let Some(input) = inputs.first() else {
            return Err(TransformError::no_output(tool_id));
        };
        let mut bytes = input.bytes().to_vec();
        bytes.push(b'|');
        bytes.extend_from_slice(tool_id.as_bytes());

        Ok(TransformOutput::single(
            OutputFile::new(input.name(), bytes),
            self.delay.unwrap_or_default(),
        ))
    }
}
