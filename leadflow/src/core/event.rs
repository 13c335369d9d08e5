//! Flow event type emitted on every stage transition.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{StageKey, StageStatus};

/// An event describing a change in a lead flow.
///
/// Events are consumed by event sinks for logging, monitoring, or tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEvent {
    /// The event type (e.g., "stage.started", "stage.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (ISO 8601).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl FlowEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the event data as a JSON object.
    #[must_use]
    pub fn data_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.data.clone().into_iter().collect())
    }

    /// The event type for a stage entering `status`.
    #[must_use]
    pub fn type_for(status: StageStatus) -> &'static str {
        match status {
            StageStatus::Pending => "stage.pending",
            StageStatus::Running => "stage.started",
            StageStatus::Success => "stage.succeeded",
            StageStatus::Warning => "stage.warning",
            StageStatus::Error => "stage.failed",
            StageStatus::Manual => "stage.awaiting_input",
        }
    }

    /// Creates a stage transition event.
    #[must_use]
    pub fn transition(lead_id: &str, stage: StageKey, from: StageStatus, to: StageStatus) -> Self {
        Self::new(Self::type_for(to))
            .add_data("lead_id", serde_json::json!(lead_id))
            .add_data("stage", serde_json::json!(stage))
            .add_data("from", serde_json::json!(from))
            .add_data("to", serde_json::json!(to))
    }

    /// Creates a "stage.overridden" event.
    #[must_use]
    pub fn overridden(lead_id: &str, stage: StageKey, from: StageStatus) -> Self {
        Self::new("stage.overridden")
            .add_data("lead_id", serde_json::json!(lead_id))
            .add_data("stage", serde_json::json!(stage))
            .add_data("from", serde_json::json!(from))
            .add_data("to", serde_json::json!(StageStatus::Success))
    }

    /// Creates a "flow.completed" event.
    #[must_use]
    pub fn completed(lead_id: &str, assigned_to: &str) -> Self {
        Self::new("flow.completed")
            .add_data("lead_id", serde_json::json!(lead_id))
            .add_data("assigned_to", serde_json::json!(assigned_to))
    }

    /// Returns the stage this event refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<StageKey> {
        self.data
            .get("stage")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
