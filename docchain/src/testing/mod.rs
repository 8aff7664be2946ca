//! Testing utilities for docchain pipelines.
//!
//! This module provides:
//! - A scripted transformation service
//! - Assertions over session state
//! - Session and payload fixtures

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_retained_only, assert_step_failed_with, assert_step_status};
pub use fixtures::{payload, session_with_tools, started_session};
pub use mocks::ScriptedTransformService;
