//! Drives single steps through an external transformation service.
//!
//! The session itself never awaits. [`StepRunner`] sequences
//! `set_step_processing`, the service call, and exactly one of
//! `complete_step`/`fail_step`, releasing the session lock while the
//! service runs. A result that settles after the run was cancelled or
//! reset is discarded.
//!
//! A step only runs once every earlier step is done or skipped. A failed
//! step is never re-run until [`PipelineSession::retry_step`] moves it back
//! to configuring.

use super::PipelineSession;
use crate::core::Payload;
use crate::errors::TransformError;
use crate::observability::StepTimer;
use crate::tools::{OutputFile, StepOptions, TransformOutput, TransformService, TransformStats};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// What happened to a step handed to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step is done. Files beyond the first are returned to the caller.
    Completed {
        /// Step index.
        step: usize,
        /// Stored output.
        output: Payload,
        /// Secondary files not threaded to the next step.
        extra_files: Vec<OutputFile>,
        /// Service statistics.
        stats: TransformStats,
    },
    /// The step failed and the pointer did not move.
    Failed {
        /// Step index.
        step: usize,
        /// Error recorded on the step.
        error: String,
    },
    /// The run went away while the service was working.
    Discarded {
        /// Step index.
        step: usize,
    },
    /// The step was not run because `blocked_by` must first be retried,
    /// skipped or completed. `blocked_by` may be the step itself.
    Blocked {
        /// Step index.
        step: usize,
        /// The failed or unsettled step standing in the way.
        blocked_by: usize,
    },
}

impl StepOutcome {
    /// Returns true if the step completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The step index.
    #[must_use]
    pub fn step(&self) -> usize {
        match self {
            Self::Completed { step, .. }
            | Self::Failed { step, .. }
            | Self::Discarded { step }
            | Self::Blocked { step, .. } => *step,
        }
    }
}

struct Prepared {
    tool: String,
    input: Payload,
    run_id: Option<Uuid>,
}

/// Runs steps against a [`TransformService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner {
    auto_advance: bool,
}

impl StepRunner {
    /// Creates a runner that leaves the pointer alone.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the pointer to the next step after each success.
    #[must_use]
    pub fn with_auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Runs `step` once.
    pub async fn run_step<S>(
        &self,
        session: &Mutex<PipelineSession>,
        service: &S,
        step: usize,
        options: &StepOptions,
    ) -> StepOutcome
    where
        S: TransformService + ?Sized,
    {
        let prepared = match Self::prepare(session, step) {
            Ok(prepared) => prepared,
            Err(outcome) => return outcome,
        };

        debug!(step, tool = %prepared.tool, "Invoking transformation");
        let timer = StepTimer::start(step);
        let result = service
            .transform(&prepared.tool, vec![prepared.input], options)
            .await;
        debug!(step, elapsed_ms = timer.elapsed_ms(), ok = result.is_ok(), "Transformation returned");

        let settled = {
            let mut guard = session.lock();
            if guard.is_executing() && guard.run_id() == prepared.run_id {
                Ok(self.settle(&mut guard, step, &prepared.tool, result))
            } else {
                Err(guard.event_sink())
            }
        };

        match settled {
            Ok(outcome) => outcome,
            Err(sink) => {
                warn!(step, tool = %prepared.tool, "Discarding result for a run that ended");
                sink.emit(
                    "step.discarded",
                    Some(serde_json::json!({
                        "step": step,
                        "tool": prepared.tool,
                        "run_id": prepared.run_id.map(|id| id.to_string()),
                    })),
                )
                .await;
                StepOutcome::Discarded { step }
            }
        }
    }

    /// Runs steps from the current pointer to the end, stopping at the first
    /// step that does not complete. Steps already done or skipped are passed over.
    pub async fn run_remaining<S, F>(
        &self,
        session: &Mutex<PipelineSession>,
        service: &S,
        mut options_for: F,
    ) -> Vec<StepOutcome>
    where
        S: TransformService + ?Sized,
        F: FnMut(usize, &str) -> StepOptions,
    {
        let mut outcomes = Vec::new();
        let (first, last) = {
            let guard = session.lock();
            (guard.current_step().unwrap_or(0).max(1), guard.step_count())
        };

        for step in first..=last {
            let options = {
                let guard = session.lock();
                if guard.step_status(step).is_terminal() {
                    continue;
                }
                options_for(step, guard.tool_at(step).unwrap_or_default())
            };
            let outcome = self.run_step(session, service, step, &options).await;
            let completed = outcome.is_completed();
            outcomes.push(outcome);
            if !completed {
                break;
            }
        }

        outcomes
    }

    fn prepare(session: &Mutex<PipelineSession>, step: usize) -> Result<Prepared, StepOutcome> {
        let mut guard = session.lock();
        if !guard.is_executing() {
            warn!(step, "No run in progress");
            return Err(StepOutcome::Discarded { step });
        }
        let Some(tool) = guard.tool_at(step).map(str::to_string) else {
            return Err(Self::fail(&mut guard, step, &TransformError::unknown_step(step)));
        };
        let blocked_by = if guard.step_status(step).is_retryable() {
            Some(step)
        } else {
            guard.blocking_step(step)
        };
        if let Some(blocked_by) = blocked_by {
            warn!(step, blocked_by, status = %guard.step_status(blocked_by), "Step is blocked");
            return Err(StepOutcome::Blocked { step, blocked_by });
        }
        let Some(input) = guard.get_step_input(step).cloned() else {
            return Err(Self::fail(&mut guard, step, &TransformError::missing_input(step)));
        };
        guard.set_step_processing(step);
        Ok(Prepared {
            tool,
            input,
            run_id: guard.run_id(),
        })
    }

    fn settle(
        &self,
        session: &mut PipelineSession,
        step: usize,
        tool: &str,
        result: Result<TransformOutput, TransformError>,
    ) -> StepOutcome {
        let output = match result {
            Ok(output) => output,
            Err(err) => return Self::fail(session, step, &err),
        };
        let stats = output.stats();
        let mut files = output.files.into_iter();
        let Some(primary) = files.next() else {
            return Self::fail(session, step, &TransformError::no_output(tool));
        };

        let payload = primary.into_payload();
        session.complete_step(step, payload.clone());
        if self.auto_advance && step < session.step_count() {
            session.advance_to_step(step + 1);
        }
        StepOutcome::Completed {
            step,
            output: payload,
            extra_files: files.collect(),
            stats,
        }
    }

    fn fail(session: &mut PipelineSession, step: usize, err: &TransformError) -> StepOutcome {
        let error = err.to_string();
        session.fail_step(step, error.clone());
        StepOutcome::Failed { step, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepStatus;
    use crate::testing::{payload, started_session, ScriptedTransformService};
    use crate::tools::MockTransformService;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_step_completes_and_stores_output() {
        let session = Mutex::new(started_session(&["rotate"], payload("in")));
        let service = ScriptedTransformService::new();

        let outcome = StepRunner::new()
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;

        assert!(outcome.is_completed());
        let guard = session.lock();
        assert_eq!(guard.step_status(1), StepStatus::Done);
        assert_eq!(guard.intermediate_result(1).unwrap().bytes(), b"in|rotate");
        assert_eq!(service.calls(), vec!["rotate".to_string()]);
    }

    #[tokio::test]
    async fn test_run_step_records_rejection_verbatim() {
        let session = Mutex::new(started_session(&["encrypt"], payload("in")));
        let service = ScriptedTransformService::new().fail_next("encrypt", "password too short");

        let outcome = StepRunner::new()
            .with_auto_advance(true)
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;

        assert_eq!(
            outcome,
            StepOutcome::Failed {
                step: 1,
                error: "password too short".to_string()
            }
        );
        let guard = session.lock();
        assert_eq!(guard.step_status(1), StepStatus::Failed);
        assert_eq!(guard.step_error(1), "password too short");
        assert_eq!(guard.current_step(), Some(0));
    }

    #[tokio::test]
    async fn test_run_step_without_input_fails() {
        let mut started = PipelineSession::default();
        started.add_tool("rotate");
        started.start_pipeline();
        let session = Mutex::new(started);

        let outcome = StepRunner::new()
            .run_step(&session, &ScriptedTransformService::new(), 1, &StepOptions::new())
            .await;

        assert_eq!(
            outcome,
            StepOutcome::Failed {
                step: 1,
                error: "No input available for step 1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_run_step_unknown_step_fails() {
        let session = Mutex::new(started_session(&["rotate"], payload("in")));
        let outcome = StepRunner::new()
            .run_step(&session, &ScriptedTransformService::new(), 4, &StepOptions::new())
            .await;
        assert!(matches!(outcome, StepOutcome::Failed { step: 4, .. }));
    }

    #[tokio::test]
    async fn test_run_step_behind_failed_step_is_blocked() {
        let mut started = started_session(&["a", "b", "c"], payload("in"));
        started.complete_step(1, payload("in|a"));
        started.fail_step(2, "corrupt");
        let session = Mutex::new(started);
        let service = ScriptedTransformService::new();

        let outcome = StepRunner::new()
            .run_step(&session, &service, 3, &StepOptions::new())
            .await;

        assert_eq!(outcome, StepOutcome::Blocked { step: 3, blocked_by: 2 });
        assert_eq!(service.call_count(), 0);
        let guard = session.lock();
        assert_eq!(guard.step_status(3), StepStatus::Pending);
        assert_eq!(guard.step_error(3), "");
        assert!(guard.intermediate_result(3).is_none());
    }

    #[tokio::test]
    async fn test_run_step_behind_pending_step_is_blocked() {
        let session = Mutex::new(started_session(&["a", "b"], payload("in")));
        let service = ScriptedTransformService::new();

        let outcome = StepRunner::new()
            .run_step(&session, &service, 2, &StepOptions::new())
            .await;

        assert_eq!(outcome, StepOutcome::Blocked { step: 2, blocked_by: 1 });
        assert_eq!(outcome.step(), 2);
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_step_needs_retry_before_rerun() {
        let mut started = started_session(&["a"], payload("in"));
        started.fail_step(1, "boom");
        let session = Mutex::new(started);
        let service = ScriptedTransformService::new();
        let runner = StepRunner::new().with_auto_advance(true);

        let outcomes = runner
            .run_remaining(&session, &service, |_, _| StepOptions::new())
            .await;
        assert_eq!(outcomes, vec![StepOutcome::Blocked { step: 1, blocked_by: 1 }]);
        assert_eq!(service.call_count(), 0);
        assert_eq!(session.lock().step_error(1), "boom");

        assert!(session.lock().retry_step(1));
        let outcomes = runner
            .run_remaining(&session, &service, |_, _| StepOptions::new())
            .await;
        assert!(outcomes[0].is_completed());
        let guard = session.lock();
        assert_eq!(guard.step_status(1), StepStatus::Done);
        assert!(guard.step_errors().is_empty());
    }

    #[tokio::test]
    async fn test_run_step_not_executing_is_discarded() {
        let mut idle = PipelineSession::default();
        idle.add_tool("rotate");
        let session = Mutex::new(idle);

        let outcome = StepRunner::new()
            .run_step(&session, &ScriptedTransformService::new(), 1, &StepOptions::new())
            .await;
        assert_eq!(outcome, StepOutcome::Discarded { step: 1 });
    }

    #[tokio::test]
    async fn test_empty_output_fails_step() {
        let session = Mutex::new(started_session(&["split"], payload("in")));
        let mut service = MockTransformService::new();
        service
            .expect_transform()
            .times(1)
            .returning(|_, _, _| Ok(TransformOutput::default()));

        let outcome = StepRunner::new()
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;

        assert_eq!(
            outcome,
            StepOutcome::Failed {
                step: 1,
                error: "Tool 'split' produced no output".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_extra_files_are_returned() {
        let session = Mutex::new(started_session(&["split", "rotate"], payload("in")));
        let mut service = MockTransformService::new();
        service
            .expect_transform()
            .withf(|tool, inputs, _| tool.to_string() == "split" && inputs.len() == 1)
            .returning(|_, _, _| {
                Ok(TransformOutput {
                    files: vec![
                        OutputFile::new("p1.pdf", b"one".to_vec()).with_page_count(1),
                        OutputFile::new("p2.pdf", b"two".to_vec()).with_page_count(1),
                    ],
                    processing_time: Duration::from_millis(40),
                })
            });

        let outcome = StepRunner::new()
            .with_auto_advance(true)
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;

        let StepOutcome::Completed { output, extra_files, stats, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(output.name(), "p1.pdf");
        assert_eq!(extra_files.len(), 1);
        assert_eq!(stats.total_pages, 2);

        let guard = session.lock();
        assert_eq!(guard.current_step(), Some(2));
        assert_eq!(guard.step_status(2), StepStatus::Configuring);
    }

    struct CancellingService {
        session: Arc<Mutex<PipelineSession>>,
        reset: bool,
    }

    #[async_trait]
    impl TransformService for CancellingService {
        async fn transform(
            &self,
            tool_id: &str,
            _inputs: Vec<Payload>,
            _options: &StepOptions,
        ) -> Result<TransformOutput, TransformError> {
            {
                let mut guard = self.session.lock();
                if self.reset {
                    guard.reset_pipeline();
                } else {
                    guard.cancel_pipeline();
                }
            }
            Ok(TransformOutput::single(
                OutputFile::new(format!("{tool_id}.pdf"), b"late".to_vec()),
                Duration::ZERO,
            ))
        }
    }

    #[tokio::test]
    async fn test_late_completion_after_cancel_is_discarded() {
        let session = Arc::new(Mutex::new(started_session(&["rotate"], payload("in"))));
        let service = CancellingService {
            session: Arc::clone(&session),
            reset: false,
        };

        let outcome = StepRunner::new()
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;

        assert_eq!(outcome, StepOutcome::Discarded { step: 1 });
        let guard = session.lock();
        assert_eq!(guard.step_status(1), StepStatus::Processing);
        assert!(guard.intermediate_result(1).is_none());
    }

    #[tokio::test]
    async fn test_late_completion_after_restart_is_discarded() {
        let session = Arc::new(Mutex::new(started_session(&["rotate"], payload("in"))));
        let service = CancellingService {
            session: Arc::clone(&session),
            reset: true,
        };

        let outcome = StepRunner::new()
            .run_step(&session, &service, 1, &StepOptions::new())
            .await;
        assert_eq!(outcome, StepOutcome::Discarded { step: 1 });

        // A new run started in the meantime must not receive the old result.
        let mut guard = session.lock();
        guard.start_pipeline();
        assert_eq!(guard.step_status(1), StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_run_remaining_chains_outputs() {
        let session = Mutex::new(started_session(&["a", "b", "c"], payload("in")));
        let service = ScriptedTransformService::new();

        let outcomes = StepRunner::new()
            .with_auto_advance(true)
            .run_remaining(&session, &service, |_, _| StepOptions::new())
            .await;

        assert_eq!(outcomes.len(), 3);
        let guard = session.lock();
        assert!(guard.is_finished());
        assert_eq!(guard.final_output().unwrap().bytes(), b"in|a|b|c");
        assert_eq!(guard.intermediate_results().keys().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_run_remaining_stops_at_failure() {
        let session = Mutex::new(started_session(&["a", "b", "c"], payload("in")));
        let service = ScriptedTransformService::new().fail_next("b", "corrupt page");

        let outcomes = StepRunner::new()
            .with_auto_advance(true)
            .run_remaining(&session, &service, |_, _| StepOptions::new())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].step(), 2);
        let guard = session.lock();
        assert_eq!(guard.step_status(2), StepStatus::Failed);
        assert_eq!(guard.step_status(3), StepStatus::Pending);
        assert_eq!(guard.current_step(), Some(2));
        assert_eq!(service.calls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_run_remaining_resumes_after_skip() {
        let session = Mutex::new(started_session(&["a", "b", "c"], payload("in")));
        let service = ScriptedTransformService::new().fail_next("b", "corrupt page");
        let runner = StepRunner::new().with_auto_advance(true);

        runner.run_remaining(&session, &service, |_, _| StepOptions::new()).await;
        {
            let mut guard = session.lock();
            guard.skip_step(2);
            guard.advance_to_step(3);
        }
        let outcomes = runner
            .run_remaining(&session, &service, |step, tool| {
                let mut options = StepOptions::new();
                options.insert("step".to_string(), serde_json::json!(step));
                options.insert("tool".to_string(), serde_json::json!(tool));
                options
            })
            .await;

        assert_eq!(outcomes.len(), 1);
        let guard = session.lock();
        assert!(guard.is_finished());
        assert_eq!(guard.final_output().unwrap().bytes(), b"in|a|c");
    }
}
