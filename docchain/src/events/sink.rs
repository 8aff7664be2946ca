//! Event sinks for pipeline sessions.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn, Level};

/// Receives the structured events a session emits.
///
/// Session operations are synchronous and call [`try_emit`](Self::try_emit);
/// the async [`emit`](Self::emit) is used from the step runner.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// # Arguments
    ///
    /// * `event_type` - Dotted event name, e.g. `step.completed`
    /// * `data` - Event payload; session events always carry `run_id` and `timestamp`
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event from synchronous code. Must not panic.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// Discards every event. The session default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// Writes events to `tracing`, lifting `step`, `tool` and `run_id` into fields.
///
/// `step.failed` and `step.discarded` are always logged at warn.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingEventSink {
    /// Logs routine events at `level`. Anything more verbose than info is logged at debug.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Logs routine events at debug.
    #[must_use]
    pub fn verbose() -> Self {
        Self::new(Level::DEBUG)
    }

    /// The level routine events are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    fn log_event(&self, event_type: &str, data: Option<&serde_json::Value>) {
        let field = |name: &str| {
            data.and_then(|d| d.get(name))
                .filter(|v| !v.is_null())
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .unwrap_or_default()
        };
        let (step, tool, run_id) = (field("step"), field("tool"), field("run_id"));

        if matches!(event_type, "step.failed" | "step.discarded") {
            warn!(event_type, step = %step, tool = %tool, run_id = %run_id, data = ?data, "Pipeline event");
        } else if self.level > Level::INFO {
            debug!(event_type, step = %step, tool = %tool, run_id = %run_id, "Pipeline event");
        } else {
            info!(event_type, step = %step, tool = %tool, run_id = %run_id, "Pipeline event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// An event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Dotted event name.
    pub event_type: String,
    /// Event payload.
    pub data: Option<serde_json::Value>,
}

/// Keeps every event in memory, for tests and UI replay.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
        });
    }

    /// Snapshot of every event in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Event names in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Events whose name starts with `prefix` (`"step."` selects every step event).
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// The most recent event.
    #[must_use]
    pub fn last(&self) -> Option<RecordedEvent> {
        self.events.read().last().cloned()
    }

    /// Number of events held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.record(event_type, data);
    }
}

/// Forwards each event to several sinks, in order.
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for FanoutEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutEventSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanoutEventSink {
    /// Creates a sink with no targets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl EventSink for FanoutEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        for sink in &self.sinks {
            sink.emit(event_type, data.clone()).await;
        }
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        for sink in &self.sinks {
            sink.try_emit(event_type, data.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_noop_sink_accepts_everything() {
        let sink = NoOpEventSink;
        sink.emit("pipeline.started", None).await;
        sink.try_emit("step.completed", Some(json!({"step": 1})));
    }

    #[tokio::test]
    async fn test_logging_sink_handles_missing_fields() {
        let sink = LoggingEventSink::verbose();
        assert_eq!(sink.level(), Level::DEBUG);
        sink.emit("step.failed", Some(json!({"step": 2, "tool": "ocr", "run_id": null}))).await;
        sink.try_emit("pipeline.reset", None);
        LoggingEventSink::default().try_emit("validation.updated", Some(json!([])));
    }

    #[tokio::test]
    async fn test_collecting_sink_keeps_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("pipeline.started", None).await;
        sink.try_emit("step.completed", Some(json!({"step": 1})));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["pipeline.started", "step.completed"]);
        let last = sink.last().unwrap();
        assert_eq!(last.data, Some(json!({"step": 1})));
    }

    #[test]
    fn test_collecting_sink_prefix_filter() {
        let sink = CollectingEventSink::new();
        sink.try_emit("step.processing", None);
        sink.try_emit("step.completed", None);
        sink.try_emit("builder.tool_rejected", None);

        assert_eq!(sink.events_of_type("step.").len(), 2);
        assert_eq!(sink.events_of_type("builder.").len(), 1);

        sink.clear();
        assert!(sink.last().is_none());
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_sink() {
        let first = Arc::new(CollectingEventSink::new());
        let second = Arc::new(CollectingEventSink::new());
        let fanout = FanoutEventSink::new()
            .with_sink(first.clone())
            .with_sink(Arc::new(LoggingEventSink::default()))
            .with_sink(second.clone());

        fanout.try_emit("step.skipped", Some(json!({"step": 3})));
        fanout.emit("pipeline.cancelled", None).await;

        assert_eq!(first.event_types(), vec!["step.skipped", "pipeline.cancelled"]);
        assert_eq!(first.events(), second.events());
    }
}
