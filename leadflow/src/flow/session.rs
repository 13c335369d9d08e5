//! One operator session over one lead.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::api::LeadData;
use crate::cancellation::CancellationToken;
use crate::core::{FlowEvent, StageKey};
use crate::errors::{AssignmentError, LeadflowError};

use super::{AssignmentDraft, FlowPhase, FlowSummary, LeadFlow, OverrideBuffer, StageSequencer};

/// Owns a flow together with everything the operator edits while it runs.
///
/// All state is in memory. Dropping the session cancels any in-flight
/// request and discards the flow; nothing already sent to the backend is
/// rolled back.
#[derive(Debug)]
pub struct LeadSession {
    flow: LeadFlow,
    lead: LeadData,
    overrides: OverrideBuffer,
    draft: Option<AssignmentDraft>,
    sequencer: StageSequencer,
}

impl LeadSession {
    /// Opens a session for a lead.
    #[must_use]
    pub fn new(lead_id: impl Into<String>, lead: LeadData, sequencer: StageSequencer) -> Self {
        Self {
            flow: LeadFlow::new(lead_id),
            lead,
            overrides: OverrideBuffer::new(),
            draft: None,
            sequencer,
        }
    }

    /// The flow.
    #[must_use]
    pub fn flow(&self) -> &LeadFlow {
        &self.flow
    }

    /// Contact data used for the duplicate check.
    #[must_use]
    pub fn lead(&self) -> &LeadData {
        &self.lead
    }

    /// A handle that cancels this session from another task.
    #[must_use]
    pub fn cancellation(&self) -> Arc<CancellationToken> {
        Arc::clone(self.sequencer.cancellation())
    }

    /// Runs the automated stages and opens the assignment form.
    pub async fn run_automation(&mut self) -> Result<(), LeadflowError> {
        self.sequencer.run(&mut self.flow, &self.lead).await?;
        if self.flow.phase() == FlowPhase::AwaitingAssignment {
            self.draft = Some(AssignmentDraft::new());
        }
        Ok(())
    }

    /// Buffers a manual value for a stage.
    pub fn set_override_field(
        &mut self,
        stage: StageKey,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.overrides.set_field(stage, key, value);
    }

    /// Values buffered for a stage.
    #[must_use]
    pub fn override_fields(&self, stage: StageKey) -> Option<&Map<String, Value>> {
        self.overrides.fields(stage)
    }

    /// Completes a `warning` or `error` stage with the buffered values.
    pub async fn apply_override(&mut self, stage: StageKey) -> Result<FlowEvent, LeadflowError> {
        let event = self.overrides.apply(&mut self.flow, stage)?;
        info!(lead_id = self.flow.lead_id(), stage = stage.as_str(), "Stage completed manually");
        self.sequencer.sink().emit(&event).await;
        Ok(event)
    }

    /// The open assignment form, once automation has finished.
    #[must_use]
    pub fn draft(&self) -> Option<&AssignmentDraft> {
        self.draft.as_ref()
    }

    /// Edits the open assignment form.
    pub fn draft_mut(&mut self) -> Option<&mut AssignmentDraft> {
        self.draft.as_mut()
    }

    /// Submits the assignment form and completes the flow.
    ///
    /// On failure the form stays open with its values for another attempt.
    pub async fn submit_assignment(&mut self) -> Result<FlowSummary, LeadflowError> {
        let Some(draft) = self.draft.as_ref() else {
            return Err(
                AssignmentError::NotAwaitingAssignment(self.flow.status(StageKey::Assignment)).into(),
            );
        };

        let cancel = self.sequencer.cancellation();
        let api = Arc::clone(self.sequencer.api());
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(LeadflowError::Cancelled(
                    cancel.reason().unwrap_or_else(|| "cancelled".to_string()),
                ));
            }
            result = draft.submit(api.as_ref(), &mut self.flow) => result?,
        };

        self.draft = None;
        self.sequencer.sink().emit(&event).await;
        Ok(self.summary())
    }

    /// Summary of the flow as it stands.
    #[must_use]
    pub fn summary(&self) -> FlowSummary {
        FlowSummary::from_flow(&self.flow)
    }

    /// Closes the session, discarding all in-memory state.
    pub fn close(self) {
        info!(
            lead_id = self.flow.lead_id(),
            complete = self.flow.is_complete(),
            "Closing lead session"
        );
    }
}

impl Drop for LeadSession {
    fn drop(&mut self) {
        self.sequencer.cancellation().cancel("session closed");
    }
}
