//! The lead-flow state machine.
//!
//! [`LeadFlow::apply`] is the only way stage state changes. It performs no
//! I/O and either applies a transition completely or rejects it without
//! touching the flow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ScoreCard;
use crate::core::{AssignmentRecord, FlowEvent, StageKey, StagePayload, StageState, StageStatus};
use crate::errors::TransitionError;
use crate::utils::{generate_uuid, now, Timestamp};

/// What a running stage resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage succeeded.
    Success(StagePayload),
    /// The stage finished with a partial or ambiguous result.
    Warning(StagePayload),
    /// The stage failed.
    Error {
        /// Message shown on the stage card.
        message: String,
        /// Whatever the stage produced before failing.
        data: Option<StagePayload>,
    },
    /// The stage needs a human to finish it.
    AwaitInput,
}

impl StageOutcome {
    /// Creates an error outcome without data.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            data: None,
        }
    }

    /// The status a stage takes on for this outcome.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        match self {
            Self::Success(_) => StageStatus::Success,
            Self::Warning(_) => StageStatus::Warning,
            Self::Error { .. } => StageStatus::Error,
            Self::AwaitInput => StageStatus::Manual,
        }
    }

    /// The data carried by the outcome, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&StagePayload> {
        match self {
            Self::Success(data) | Self::Warning(data) => Some(data),
            Self::Error { data, .. } => data.as_ref(),
            Self::AwaitInput => None,
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Warning(_) => "warning",
            Self::Error { .. } => "error",
            Self::AwaitInput => "manual",
        }
    }
}

/// A requested change to a flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Move a pending stage to running.
    Start(StageKey),
    /// Resolve a running stage.
    Resolve {
        /// The stage.
        stage: StageKey,
        /// What it resolved to.
        outcome: StageOutcome,
    },
    /// Force a warning/error stage to success with operator data.
    ManualOverride {
        /// The stage.
        stage: StageKey,
        /// Operator-entered fields.
        fields: serde_json::Map<String, serde_json::Value>,
    },
    /// Record the submitted assignment and complete the flow.
    CompleteAssignment(AssignmentRecord),
}

/// Overall position of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum FlowPhase {
    /// An automated stage is the current one.
    Running(StageKey),
    /// All automated stages finished; the assignment form is open.
    AwaitingAssignment,
    /// The lead was assigned.
    Complete,
}

/// One status change in a flow's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The stage that changed.
    pub stage: StageKey,
    /// Status before.
    pub from: StageStatus,
    /// Status after.
    pub to: StageStatus,
    /// Whether the change was a manual override.
    #[serde(default)]
    pub manual: bool,
    /// When it happened.
    pub at: Timestamp,
}

/// A single lead-intake flow instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadFlow {
    id: Uuid,
    lead_id: String,
    stages: Vec<StageState>,
    phase: FlowPhase,
    history: Vec<TransitionRecord>,
    created_at: Timestamp,
}

impl LeadFlow {
    /// Creates a flow for a lead with `record_created` running and every
    /// other stage pending.
    #[must_use]
    pub fn new(lead_id: impl Into<String>) -> Self {
        let created_at = now();
        let stages = StageKey::ALL
            .iter()
            .map(|&stage| {
                if stage == StageKey::RecordCreated {
                    StageState::running(stage)
                } else {
                    StageState::pending(stage)
                }
            })
            .collect();

        Self {
            id: generate_uuid(),
            lead_id: lead_id.into(),
            stages,
            phase: FlowPhase::Running(StageKey::RecordCreated),
            history: vec![TransitionRecord {
                stage: StageKey::RecordCreated,
                from: StageStatus::Pending,
                to: StageStatus::Running,
                manual: false,
                at: created_at,
            }],
            created_at,
        }
    }

    /// Unique id of this flow instance.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The lead this flow is processing.
    #[must_use]
    pub fn lead_id(&self) -> &str {
        &self.lead_id
    }

    /// When the flow was created.
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// Returns true once the assignment was submitted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == FlowPhase::Complete
    }

    /// State of one stage.
    #[must_use]
    pub fn stage(&self, stage: StageKey) -> &StageState {
        &self.stages[stage.index()]
    }

    /// Status of one stage.
    #[must_use]
    pub fn status(&self, stage: StageKey) -> StageStatus {
        self.stage(stage).status
    }

    /// All stage states in order.
    #[must_use]
    pub fn stages(&self) -> &[StageState] {
        &self.stages
    }

    /// Every status change so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Stages that show a "complete manually" action.
    #[must_use]
    pub fn stages_needing_attention(&self) -> Vec<StageKey> {
        self.stages
            .iter()
            .filter(|s| s.status.needs_attention())
            .map(|s| s.stage)
            .collect()
    }

    /// The automated score card, if scoring succeeded.
    #[must_use]
    pub fn score(&self) -> Option<&ScoreCard> {
        self.stage(StageKey::Scoring)
            .data
            .as_ref()
            .and_then(StagePayload::as_score)
    }

    /// The recorded assignment, once submitted.
    #[must_use]
    pub fn assignment(&self) -> Option<&AssignmentRecord> {
        self.stage(StageKey::Assignment)
            .data
            .as_ref()
            .and_then(StagePayload::as_assignment)
    }

    /// Applies a transition.
    ///
    /// Returns the event describing the change. On error the flow is left
    /// untouched.
    pub fn apply(&mut self, transition: Transition) -> Result<FlowEvent, TransitionError> {
        match transition {
            Transition::Start(stage) => self.start(stage),
            Transition::Resolve { stage, outcome } => self.resolve(stage, outcome),
            Transition::ManualOverride { stage, fields } => self.manual_override(stage, fields),
            Transition::CompleteAssignment(record) => self.complete_assignment(record),
        }
    }

    fn start(&mut self, stage: StageKey) -> Result<FlowEvent, TransitionError> {
        self.expect_status(stage, &[StageStatus::Pending], "pending")?;

        if let Some(previous) = stage.previous() {
            let status = self.status(previous);
            if !status.is_terminal() {
                return Err(TransitionError::OutOfOrder {
                    stage,
                    blocking: previous,
                    status,
                });
            }
        }

        self.phase = FlowPhase::Running(stage);
        Ok(self.record(stage, StageStatus::Running, None, None, false))
    }

    fn resolve(&mut self, stage: StageKey, outcome: StageOutcome) -> Result<FlowEvent, TransitionError> {
        self.expect_status(stage, &[StageStatus::Running], "running")?;

        let awaits_input = matches!(outcome, StageOutcome::AwaitInput);
        if awaits_input != stage.is_interactive() {
            return Err(TransitionError::InvalidOutcome {
                stage,
                outcome: outcome.label(),
            });
        }
        if let Some(payload) = outcome.payload() {
            if payload.stage() != Some(stage) {
                return Err(TransitionError::PayloadMismatch {
                    stage,
                    payload: payload.kind(),
                });
            }
        }

        let status = outcome.status();
        let event = match outcome {
            StageOutcome::Success(data) | StageOutcome::Warning(data) => {
                self.record(stage, status, Some(data), None, false)
            }
            StageOutcome::Error { message, data } => {
                self.record(stage, status, data, Some(message), false)
            }
            StageOutcome::AwaitInput => {
                self.phase = FlowPhase::AwaitingAssignment;
                self.record(stage, status, None, None, false)
            }
        };
        Ok(event)
    }

    fn manual_override(
        &mut self,
        stage: StageKey,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<FlowEvent, TransitionError> {
        self.expect_status(
            stage,
            &[StageStatus::Warning, StageStatus::Error],
            "warning or error",
        )?;

        let from = self.status(stage);
        self.record(
            stage,
            StageStatus::Success,
            Some(StagePayload::Manual { fields }),
            None,
            true,
        );
        Ok(FlowEvent::overridden(&self.lead_id, stage, from))
    }

    fn complete_assignment(&mut self, record: AssignmentRecord) -> Result<FlowEvent, TransitionError> {
        let stage = StageKey::Assignment;
        self.expect_status(stage, &[StageStatus::Manual], "manual")?;

        let assigned_to = record.assigned_to.clone();
        self.record(
            stage,
            StageStatus::Success,
            Some(StagePayload::Assignment(record)),
            None,
            false,
        );
        self.phase = FlowPhase::Complete;
        Ok(FlowEvent::completed(&self.lead_id, &assigned_to)
            .add_data("stage", serde_json::json!(stage)))
    }

    fn expect_status(
        &self,
        stage: StageKey,
        allowed: &[StageStatus],
        expected: &'static str,
    ) -> Result<(), TransitionError> {
        let actual = self.status(stage);
        if allowed.contains(&actual) {
            Ok(())
        } else {
            Err(TransitionError::UnexpectedStatus {
                stage,
                actual,
                expected,
            })
        }
    }

    fn record(
        &mut self,
        stage: StageKey,
        to: StageStatus,
        data: Option<StagePayload>,
        error: Option<String>,
        manual: bool,
    ) -> FlowEvent {
        let state = &mut self.stages[stage.index()];
        let from = state.status;
        state.set(to, data, error);
        self.history.push(TransitionRecord {
            stage,
            from,
            to,
            manual,
            at: state.updated_at,
        });

        let mut event = FlowEvent::transition(&self.lead_id, stage, from, to);
        if let Some(ref message) = state.error {
            event = event.add_data("error", serde_json::json!(message));
        }
        event
    }
}
