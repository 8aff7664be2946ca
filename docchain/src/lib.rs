//! # Docchain
//!
//! Orchestration core for chaining single-purpose document tools into a
//! linear pipeline.
//!
//! Docchain provides:
//!
//! - **Pipeline building**: an ordered tool list of bounded length, revalidated on every change
//! - **Step state machine**: per-step status and error tracking with retry and skip
//! - **Bounded retention**: only the most recent step outputs are kept in memory
//! - **Async step runner**: drives an external transformation service, discarding late results
//! - **Event-driven observability**: structured events for every transition
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docchain::prelude::*;
//! use parking_lot::Mutex;
//!
//! let mut session = PipelineSession::default();
//! session.add_tool("rotate");
//! session.add_tool("compress");
//! session.start_pipeline();
//! session.set_original_input(Payload::new("scan.pdf", bytes));
//! session.advance_to_step(1);
//!
//! let session = Mutex::new(session);
//! StepRunner::new()
//!     .with_auto_advance(true)
//!     .run_remaining(&session, &service, |_, _| StepOptions::new())
//!     .await;
//! let output = session.lock().final_output().cloned();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod buffers;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod testing;
pub mod tools;
pub mod utils;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::buffers::IntermediateBuffers;
    pub use crate::config::PipelineConfig;
    pub use crate::core::{Payload, StepRecord, StepStatus};
    pub use crate::errors::{ConfigError, DocchainError, TransformError};
    pub use crate::events::{
        CollectingEventSink, EventSink, FanoutEventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::observability::{init_tracing, LogFormat, TracingConfig};
    pub use crate::pipeline::{
        builtin_presets, PipelineSession, Preset, Progress, StepOutcome, StepRunner,
    };
    pub use crate::tools::{
        OutputFile, StepOptions, ToolMetadata, ToolRegistry, TransformOutput, TransformService,
    };
    pub use crate::validation::{
        RuleValidator, ValidationResult, ValidationRules, ValidationWarning, Validator,
        WarningKind,
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_prelude_builds_a_session() {
        let mut session = PipelineSession::new(PipelineConfig::default());
        assert!(session.add_tool("rotate"));
        assert_eq!(session.selected_tools().len(), 1);
    }
}
