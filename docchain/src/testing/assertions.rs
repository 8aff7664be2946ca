//! Assertions over pipeline session state.

use crate::core::StepStatus;
use crate::pipeline::PipelineSession;

/// Asserts that `step` has the expected status.
pub fn assert_step_status(session: &PipelineSession, step: usize, expected: StepStatus) {
    let actual = session.step_status(step);
    assert_eq!(
        actual, expected,
        "Expected step {step} to be {expected}, got {actual}"
    );
}

/// Asserts that `step` failed with `message`.
pub fn assert_step_failed_with(session: &PipelineSession, step: usize, message: &str) {
    assert_step_status(session, step, StepStatus::Failed);
    assert_eq!(
        session.step_error(step),
        message,
        "Unexpected error message for step {step}"
    );
}

/// Asserts that exactly `steps` have retained outputs.
pub fn assert_retained_only(session: &PipelineSession, steps: &[usize]) {
    let retained: Vec<usize> = session.intermediate_results().keys().copied().collect();
    assert_eq!(
        retained, steps,
        "Expected retained outputs for steps {steps:?}, got {retained:?}"
    );
}
