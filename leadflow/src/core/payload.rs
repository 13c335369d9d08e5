//! Stage payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::{CheckResult, EnrichmentStatus, FollowUpSla, ScoreCard};
use crate::core::StageKey;
use crate::utils::Timestamp;

/// The assignment recorded when the operator submits the assignment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Owner the lead was assigned to.
    pub assigned_to: String,
    /// Promised follow-up window.
    pub follow_up_sla: FollowUpSla,
    /// Optional note for the owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_note: Option<String>,
    /// When the follow-up is due.
    pub follow_up_due: Timestamp,
}

/// Data attached to a stage once it produced a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    /// The lead record exists.
    RecordCreated {
        /// Identifier of the lead.
        lead_id: String,
    },
    /// Duplicate-check matches (empty when none were found).
    Duplicates {
        /// Matching lead records as returned by the backend.
        duplicates: Vec<serde_json::Value>,
    },
    /// Enrichment outcome.
    Enrichment {
        /// Status reported by the enrichment endpoint.
        status: EnrichmentStatus,
        /// Fields that were filled in.
        enriched_fields: serde_json::Map<String, serde_json::Value>,
    },
    /// Per-check validation results.
    Validation {
        /// Check name to result.
        results: BTreeMap<String, CheckResult>,
    },
    /// Lead score card.
    Score(ScoreCard),
    /// Final assignment.
    Assignment(AssignmentRecord),
    /// Operator-supplied data that replaced an automated result.
    Manual {
        /// Whatever the operator entered.
        fields: serde_json::Map<String, serde_json::Value>,
    },
}

impl StagePayload {
    /// The stage that produces this payload, or `None` for operator data.
    #[must_use]
    pub const fn stage(&self) -> Option<StageKey> {
        match self {
            Self::RecordCreated { .. } => Some(StageKey::RecordCreated),
            Self::Duplicates { .. } => Some(StageKey::DuplicateCheck),
            Self::Enrichment { .. } => Some(StageKey::Enrichment),
            Self::Validation { .. } => Some(StageKey::Validation),
            Self::Score(_) => Some(StageKey::Scoring),
            Self::Assignment(_) => Some(StageKey::Assignment),
            Self::Manual { .. } => None,
        }
    }

    /// Short name of the payload kind, as used in the serialized `kind` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RecordCreated { .. } => "record_created",
            Self::Duplicates { .. } => "duplicates",
            Self::Enrichment { .. } => "enrichment",
            Self::Validation { .. } => "validation",
            Self::Score(_) => "score",
            Self::Assignment(_) => "assignment",
            Self::Manual { .. } => "manual",
        }
    }

    /// Returns true if the payload was entered by an operator.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }

    /// Returns the score card, if this is a score payload.
    #[must_use]
    pub fn as_score(&self) -> Option<&ScoreCard> {
        match self {
            Self::Score(card) => Some(card),
            _ => None,
        }
    }

    /// Returns the assignment, if this is an assignment payload.
    #[must_use]
    pub fn as_assignment(&self) -> Option<&AssignmentRecord> {
        match self {
            Self::Assignment(record) => Some(record),
            _ => None,
        }
    }

    /// Flat JSON view of the payload as a stage card renders it.
    ///
    /// Manual payloads render as `{"manual": true, ...fields}`.
    #[must_use]
    pub fn to_view(&self) -> serde_json::Value {
        match self {
            Self::RecordCreated { lead_id } => serde_json::json!({ "leadId": lead_id }),
            Self::Duplicates { duplicates } => serde_json::json!({ "duplicates": duplicates }),
            Self::Enrichment {
                status,
                enriched_fields,
            } => serde_json::json!({
                "enrichment_status": status,
                "enriched_fields": enriched_fields,
            }),
            Self::Validation { results } => serde_json::json!({ "validation_results": results }),
            Self::Score(card) => serde_json::to_value(card).unwrap_or_default(),
            Self::Assignment(record) => serde_json::to_value(record).unwrap_or_default(),
            Self::Manual { fields } => {
                let mut view = serde_json::Map::new();
                view.insert("manual".to_string(), serde_json::Value::Bool(true));
                for (key, value) in fields {
                    if key != "manual" {
                        view.insert(key.clone(), value.clone());
                    }
                }
                serde_json::Value::Object(view)
            }
        }
    }
}
