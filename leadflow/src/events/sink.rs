//! Event sink trait and implementations.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::core::FlowEvent;

/// Trait for sinks that receive flow events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event.
    ///
    /// Implementations must not panic; failures are logged and dropped.
    async fn emit(&self, event: &FlowEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &FlowEvent) {}
}

/// A sink that logs events through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &FlowEvent) {
        let lead_id = event
            .data
            .get("lead_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let stage = event.stage().map_or("-", |s| s.as_str());

        info!(
            event_type = %event.event_type,
            lead_id,
            stage,
            event_data = %event.data_json(),
            "Event: {}", event.event_type
        );
    }
}

/// A sink that keeps every event in memory, for tests and the CLI timeline.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<FlowEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<FlowEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns events whose type starts with a prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<FlowEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &FlowEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageKey, StageStatus};

    fn started(stage: StageKey) -> FlowEvent {
        FlowEvent::transition("LEAD-001", stage, StageStatus::Pending, StageStatus::Running)
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(&started(StageKey::Enrichment)).await;
        sink.emit(&FlowEvent::new("flow.completed")).await;
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink;
        sink.emit(&started(StageKey::Validation)).await;
        sink.emit(&FlowEvent::new("flow.completed")).await;
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&started(StageKey::DuplicateCheck)).await;
        sink.emit(&FlowEvent::completed("LEAD-001", "Priya Sharma")).await;

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["stage.started", "flow.completed"]);
        assert_eq!(sink.events()[0].stage(), Some(StageKey::DuplicateCheck));
    }

    #[tokio::test]
    async fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit(&started(StageKey::Scoring)).await;
        sink.emit(&started(StageKey::Assignment)).await;
        sink.emit(&FlowEvent::completed("LEAD-001", "Priya Sharma")).await;

        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events_of_type("flow.").len(), 1);
        assert!(sink.events_of_type("lead.").is_empty());
    }
}
