//! Contract with the external transformation service.

use crate::core::Payload;
use crate::errors::TransformError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-step options forwarded verbatim to the service.
pub type StepOptions = HashMap<String, serde_json::Value>;

/// One file produced by a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// File name.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
    /// Page count, when the service reports one.
    pub page_count: Option<u32>,
}

impl OutputFile {
    /// Creates a new output file.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            page_count: None,
        }
    }

    /// Sets the page count.
    #[must_use]
    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.page_count = Some(pages);
        self
    }

    /// Converts into a payload, moving the bytes.
    #[must_use]
    pub fn into_payload(self) -> Payload {
        Payload::new(self.name, self.bytes)
    }
}

/// Result of a successful transformation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    /// Produced files, primary output first.
    pub files: Vec<OutputFile>,
    /// Time the service spent.
    pub processing_time: Duration,
}

/// Summary statistics the service may attach to a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    /// Number of files produced.
    pub file_count: usize,
    /// Sum of reported page counts.
    pub total_pages: u32,
    /// Processing time in milliseconds.
    pub processing_ms: u64,
}

impl TransformOutput {
    /// Creates an output with a single file.
    #[must_use]
    pub fn single(file: OutputFile, processing_time: Duration) -> Self {
        Self {
            files: vec![file],
            processing_time,
        }
    }

    /// Summarises the output.
    #[must_use]
    pub fn stats(&self) -> TransformStats {
        TransformStats {
            file_count: self.files.len(),
            total_pages: self.files.iter().filter_map(|f| f.page_count).sum(),
            processing_ms: u64::try_from(self.processing_time.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// The isolated worker that performs one tool's transformation.
///
/// Called by the caller between `set_step_processing` and
/// `complete_step`/`fail_step`; the session never calls it directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Runs `tool_id` over `inputs`.
    async fn transform(
        &self,
        tool_id: &str,
        inputs: Vec<Payload>,
        options: &StepOptions,
    ) -> Result<TransformOutput, TransformError>;
}
