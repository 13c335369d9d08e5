//! The assignment form.

use tracing::{info, warn};

use crate::api::{AssignmentPatch, FollowUpSla, LeadApi};
use crate::core::{AssignmentRecord, FlowEvent, StageKey, StageStatus};
use crate::errors::AssignmentError;
use crate::utils::now;

use super::{LeadFlow, Transition};

/// Values the operator enters to assign a lead.
///
/// A draft survives a failed submission so it can be sent again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDraft {
    /// Owner to assign the lead to. Required.
    pub owner: String,
    /// Follow-up window, `4_hours` unless changed.
    pub follow_up_sla: FollowUpSla,
    /// Optional note for the owner.
    pub note: Option<String>,
}

impl AssignmentDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Sets the follow-up window.
    #[must_use]
    pub fn with_sla(mut self, sla: FollowUpSla) -> Self {
        self.follow_up_sla = sla;
        self
    }

    /// Sets the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builds the update body, rejecting a blank owner.
    ///
    /// The owner is trimmed and a blank note is sent as `null`.
    pub fn to_patch(&self) -> Result<AssignmentPatch, AssignmentError> {
        let owner = self.owner.trim();
        if owner.is_empty() {
            return Err(AssignmentError::MissingOwner);
        }

        let note = self
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(AssignmentPatch {
            assigned_to: owner.to_string(),
            follow_up_sla: self.follow_up_sla,
            assignment_note: note,
        })
    }

    /// Sends the assignment and completes the flow.
    ///
    /// Nothing changes on the flow unless the backend accepted the update:
    /// a blank owner, a flow that is not awaiting assignment, or a failed
    /// call all leave the assignment stage `manual`.
    pub async fn submit(
        &self,
        api: &dyn LeadApi,
        flow: &mut LeadFlow,
    ) -> Result<FlowEvent, AssignmentError> {
        let patch = self.to_patch()?;

        let status = flow.status(StageKey::Assignment);
        if status != StageStatus::Manual {
            return Err(AssignmentError::NotAwaitingAssignment(status));
        }

        if let Err(error) = api.assign(flow.lead_id(), &patch).await {
            warn!(
                lead_id = flow.lead_id(),
                endpoint = error.endpoint(),
                error = %error,
                "Assignment update failed"
            );
            return Err(error.into());
        }

        let record = AssignmentRecord {
            follow_up_due: now() + patch.follow_up_sla.window(),
            assigned_to: patch.assigned_to,
            follow_up_sla: patch.follow_up_sla,
            assignment_note: patch.assignment_note,
        };

        let event = flow
            .apply(Transition::CompleteAssignment(record))
            .map_err(|_| AssignmentError::NotAwaitingAssignment(flow.status(StageKey::Assignment)))?;

        info!(
            lead_id = flow.lead_id(),
            assigned_to = %self.owner.trim(),
            follow_up_sla = self.follow_up_sla.as_str(),
            "Lead assigned"
        );
        Ok(event)
    }
}
