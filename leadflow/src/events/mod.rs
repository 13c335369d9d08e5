//! Event sinks for flow observability.
//!
//! Every state-machine transition produces a [`FlowEvent`](crate::core::FlowEvent)
//! that the sequencer and session hand to an [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
