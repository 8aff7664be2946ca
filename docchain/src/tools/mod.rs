//! External collaborators consumed by the pipeline.
//!
//! This module provides:
//! - The tool metadata registry (display names and duration estimates)
//! - The transformation service contract

mod registry;
mod service;

pub use registry::{ToolMetadata, ToolRegistry};
pub use service::{
    OutputFile, StepOptions, TransformOutput, TransformService, TransformStats,
};

#[cfg(test)]
pub use service::MockTransformService;
