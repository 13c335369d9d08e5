//! End-of-flow summary.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::ScoreCard;
use crate::core::{AssignmentRecord, StageKey, StagePayload, StageStatus};
use crate::utils::{elapsed_ms, now};

use super::LeadFlow;

/// What happened to a lead, for display once the flow is closed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    /// The lead.
    pub lead_id: String,
    /// Final status of every stage, in order.
    pub stages: Vec<(StageKey, StageStatus)>,
    /// Stages completed by hand.
    pub overridden: Vec<StageKey>,
    /// The automated score card, if scoring succeeded.
    pub score: Option<ScoreCard>,
    /// The operator's score, if scoring was completed by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_score: Option<ManualScore>,
    /// The assignment, if submitted.
    pub assignment: Option<AssignmentRecord>,
    /// Time from flow creation to completion, or to now if still open.
    pub elapsed_ms: i64,
}

/// Score fields an operator entered when completing scoring by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualScore {
    /// The `lead_score` field, if it held a number.
    pub lead_score: Option<f64>,
    /// The `score_label` field, if it held non-blank text.
    pub score_label: Option<String>,
}

impl ManualScore {
    fn from_fields(fields: &serde_json::Map<String, serde_json::Value>) -> Self {
        let lead_score = fields.get("lead_score").and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
        let score_label = fields
            .get("score_label")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string);

        Self {
            lead_score,
            score_label,
        }
    }
}

impl FlowSummary {
    /// Summarises a flow in its current state.
    #[must_use]
    pub fn from_flow(flow: &LeadFlow) -> Self {
        let finished_at = if flow.is_complete() {
            flow.stage(StageKey::Assignment).updated_at
        } else {
            now()
        };

        Self {
            lead_id: flow.lead_id().to_string(),
            stages: flow.stages().iter().map(|s| (s.stage, s.status)).collect(),
            overridden: flow
                .stages()
                .iter()
                .filter(|s| s.is_manual())
                .map(|s| s.stage)
                .collect(),
            score: flow.score().cloned(),
            manual_score: match flow.stage(StageKey::Scoring).data {
                Some(StagePayload::Manual { ref fields }) => Some(ManualScore::from_fields(fields)),
                _ => None,
            },
            assignment: flow.assignment().cloned(),
            elapsed_ms: elapsed_ms(flow.created_at(), finished_at),
        }
    }
}

impl fmt::Display for FlowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lead {}", self.lead_id)?;

        match (&self.score, &self.manual_score) {
            (Some(card), _) => write!(f, " scored {} ({})", card.lead_score, card.score_label)?,
            (None, Some(manual)) => match (manual.lead_score, manual.score_label.as_deref()) {
                (Some(score), Some(label)) => write!(f, " scored {score} ({label}) manually")?,
                (Some(score), None) => write!(f, " scored {score} manually")?,
                (None, Some(label)) => write!(f, " scored {label} manually")?,
                (None, None) => f.write_str(" was scored manually")?,
            },
            (None, None) => f.write_str(" was not scored")?,
        }

        match self.assignment {
            Some(ref record) => write!(
                f,
                "; assigned to {}, follow up within {}",
                record.assigned_to, record.follow_up_sla
            )?,
            None => f.write_str("; not yet assigned")?,
        }

        if !self.overridden.is_empty() {
            let names: Vec<&str> = self.overridden.iter().map(|s| s.as_str()).collect();
            write!(f, " (completed manually: {})", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FollowUpSla;

    fn hot() -> ScoreCard {
        ScoreCard {
            fit_score: 80.0,
            intent_score: 70.0,
            potential_score: 60.0,
            lead_score: 75.0,
            score_label: "Hot".to_string(),
        }
    }

    #[test]
    fn test_display_complete() {
        let summary = FlowSummary {
            lead_id: "LEAD-001".to_string(),
            stages: vec![],
            overridden: vec![],
            score: Some(hot()),
            manual_score: None,
            assignment: Some(AssignmentRecord {
                assigned_to: "Priya Sharma".to_string(),
                follow_up_sla: FollowUpSla::OneDay,
                assignment_note: None,
                follow_up_due: now(),
            }),
            elapsed_ms: 0,
        };

        assert_eq!(
            summary.to_string(),
            "Lead LEAD-001 scored 75 (Hot); assigned to Priya Sharma, follow up within 1 day"
        );
    }

    #[test]
    fn test_display_unscored_with_overrides() {
        let summary = FlowSummary {
            lead_id: "LEAD-002".to_string(),
            stages: vec![],
            overridden: vec![StageKey::Enrichment, StageKey::Scoring],
            score: None,
            manual_score: None,
            assignment: None,
            elapsed_ms: 0,
        };

        assert_eq!(
            summary.to_string(),
            "Lead LEAD-002 was not scored; not yet assigned (completed manually: enrichment, scoring)"
        );
    }

    #[test]
    fn test_display_manual_score() {
        let mut summary = FlowSummary {
            lead_id: "LEAD-004".to_string(),
            stages: vec![],
            overridden: vec![StageKey::Scoring],
            score: None,
            manual_score: Some(ManualScore {
                lead_score: Some(60.0),
                score_label: Some("Warm".to_string()),
            }),
            assignment: None,
            elapsed_ms: 0,
        };
        assert_eq!(
            summary.to_string(),
            "Lead LEAD-004 scored 60 (Warm) manually; not yet assigned (completed manually: scoring)"
        );

        summary.manual_score = Some(ManualScore::default());
        assert!(summary.to_string().starts_with("Lead LEAD-004 was scored manually;"));
    }

    #[test]
    fn test_manual_score_fields() {
        let mut fields = serde_json::Map::new();
        fields.insert("lead_score".to_string(), serde_json::json!("60"));
        fields.insert("score_label".to_string(), serde_json::json!("  "));

        assert_eq!(
            ManualScore::from_fields(&fields),
            ManualScore {
                lead_score: Some(60.0),
                score_label: None,
            }
        );
    }

    #[test]
    fn test_from_new_flow() {
        let summary = FlowSummary::from_flow(&LeadFlow::new("LEAD-003"));
        assert_eq!(summary.stages.len(), 6);
        assert_eq!(summary.stages[0], (StageKey::RecordCreated, StageStatus::Running));
        assert!(summary.score.is_none());
        assert!(summary.manual_score.is_none());
        assert!(summary.overridden.is_empty());
        assert!(summary.elapsed_ms >= 0);
    }
}
