//! Event sinks for observing a pipeline session.
//!
//! Sinks are injected per session; there is no process-wide sink.

mod sink;

pub use sink::{
    CollectingEventSink, EventSink, FanoutEventSink, LoggingEventSink, NoOpEventSink,
    RecordedEvent,
};
