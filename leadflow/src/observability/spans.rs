//! Stage spans and timing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::core::{StageKey, StageStatus};

/// Attributes recorded for one stage execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Lead being processed.
    pub lead_id: String,
    /// Stage key.
    pub stage: StageKey,
    /// Status the stage resolved to.
    pub status: Option<StageStatus>,
    /// Duration in milliseconds, including the API call.
    pub duration_ms: Option<f64>,
    /// Error message if the stage failed.
    pub error: Option<String>,
}

impl StageSpanAttributes {
    /// Creates attributes for a stage of a lead.
    #[must_use]
    pub fn new(lead_id: impl Into<String>, stage: StageKey) -> Self {
        Self {
            lead_id: lead_id.into(),
            stage,
            status: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: StageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flattens the attributes into dotted keys.
    #[must_use]
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("lead.id".to_string(), self.lead_id.clone());
        attrs.insert("stage.name".to_string(), self.stage.as_str().to_string());

        if let Some(status) = self.status {
            attrs.insert("stage.status".to_string(), status.to_string());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("stage.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("stage.error".to_string(), v.clone());
        }
        attrs
    }
}

/// Creates the span a stage runs in.
#[must_use]
pub fn stage_span(lead_id: &str, stage: StageKey) -> tracing::Span {
    tracing::info_span!("lead_stage", lead_id, stage = stage.as_str())
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
