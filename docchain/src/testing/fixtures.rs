//! Fixtures for pipeline tests.

use crate::core::Payload;
use crate::pipeline::PipelineSession;

/// Builds a payload named `<tag>.pdf` whose bytes are `tag`.
#[must_use]
pub fn payload(tag: &str) -> Payload {
    Payload::new(format!("{tag}.pdf"), tag.as_bytes().to_vec())
}

/// A builder-phase session holding `tools`.
#[must_use]
pub fn session_with_tools(tools: &[&str]) -> PipelineSession {
    let mut session = PipelineSession::default();
    for tool in tools {
        session.add_tool(*tool);
    }
    session
}

/// A started session over `tools` with `input` as the original input.
#[must_use]
pub fn started_session(tools: &[&str], input: Payload) -> PipelineSession {
    let mut session = session_with_tools(tools);
    session.start_pipeline();
    session.set_original_input(input);
    session
}
