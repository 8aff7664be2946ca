//! Pipeline building and execution.
//!
//! This module provides:
//! - The pipeline session and its builder-phase operations
//! - Execution-phase step transitions and buffer retention
//! - Named presets
//! - A runner that drives steps through a transformation service

mod builder;
mod controller;
mod preset;
mod runner;
mod session;
mod state;


pub use preset::{builtin_presets, Preset};
pub use runner::{StepOutcome, StepRunner};
pub use session::{PipelineSession, Progress};
pub use state::StepTable;
