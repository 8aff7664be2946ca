//! Core domain model types for docchain.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Step status enum
//! - Per-step record
//! - The opaque payload passed between steps

mod payload;
mod record;
mod status;

pub use payload::Payload;
pub use record::StepRecord;
pub use status::StepStatus;
