//! Manual override buffers.
//!
//! Operators type values for a stage that came back `warning` or `error`,
//! then force the stage to `success`. Field contents are never validated.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::core::{FlowEvent, StageKey};
use crate::errors::TransitionError;

use super::{LeadFlow, Transition};

/// A field the operator is prompted for when completing a stage by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualFieldSpec {
    /// Key stored in the manual payload.
    pub key: &'static str,
    /// Prompt label.
    pub label: &'static str,
}

const DUPLICATE_FIELDS: &[ManualFieldSpec] = &[
    ManualFieldSpec {
        key: "resolution",
        label: "Duplicate resolution",
    },
    ManualFieldSpec {
        key: "notes",
        label: "Notes",
    },
];

const ENRICHMENT_FIELDS: &[ManualFieldSpec] = &[
    ManualFieldSpec {
        key: "industry",
        label: "Industry",
    },
    ManualFieldSpec {
        key: "company_size",
        label: "Company size",
    },
    ManualFieldSpec {
        key: "website",
        label: "Website",
    },
];

const VALIDATION_FIELDS: &[ManualFieldSpec] = &[
    ManualFieldSpec {
        key: "email_verified",
        label: "Email verified",
    },
    ManualFieldSpec {
        key: "phone_verified",
        label: "Phone verified",
    },
    ManualFieldSpec {
        key: "notes",
        label: "Notes",
    },
];

const SCORING_FIELDS: &[ManualFieldSpec] = &[
    ManualFieldSpec {
        key: "lead_score",
        label: "Lead score",
    },
    ManualFieldSpec {
        key: "score_label",
        label: "Score label",
    },
];

/// Fields offered for completing `stage` manually.
///
/// `record_created` never needs attention and `assignment` has its own form,
/// so both return an empty list.
#[must_use]
pub fn manual_fields(stage: StageKey) -> &'static [ManualFieldSpec] {
    match stage {
        StageKey::DuplicateCheck => DUPLICATE_FIELDS,
        StageKey::Enrichment => ENRICHMENT_FIELDS,
        StageKey::Validation => VALIDATION_FIELDS,
        StageKey::Scoring => SCORING_FIELDS,
        StageKey::RecordCreated | StageKey::Assignment => &[],
    }
}

/// Operator-entered values, buffered per stage until applied.
#[derive(Debug, Clone, Default)]
pub struct OverrideBuffer {
    fields: HashMap<StageKey, Map<String, Value>>,
}

impl OverrideBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field for a stage, replacing any previous value.
    pub fn set_field(&mut self, stage: StageKey, key: impl Into<String>, value: impl Into<Value>) {
        self.fields
            .entry(stage)
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Fields buffered for a stage.
    #[must_use]
    pub fn fields(&self, stage: StageKey) -> Option<&Map<String, Value>> {
        self.fields.get(&stage)
    }

    /// Drops everything buffered for a stage.
    pub fn clear(&mut self, stage: StageKey) {
        self.fields.remove(&stage);
    }

    /// Forces `stage` to `success` with the buffered fields.
    ///
    /// The stage's buffer is cleared only if the flow accepts the override.
    /// An empty buffer is allowed.
    pub fn apply(&mut self, flow: &mut LeadFlow, stage: StageKey) -> Result<FlowEvent, TransitionError> {
        let fields = self.fields.get(&stage).cloned().unwrap_or_default();
        let event = flow.apply(Transition::ManualOverride { stage, fields })?;
        self.clear(stage);
        Ok(event)
    }
}
