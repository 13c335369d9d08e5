//! Drives a flow through its stages against the lead API.

use std::sync::Arc;

use tracing::{debug, info, warn, Instrument};

use crate::api::{DuplicateCheckRequest, LeadApi, LeadData};
use crate::cancellation::CancellationToken;
use crate::config::PacingConfig;
use crate::core::{FlowEvent, StageKey, StagePayload};
use crate::errors::{ApiError, LeadflowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::observability::{stage_span, SpanTimer, StageSpanAttributes};

use super::{outcome, LeadFlow, StageOutcome, Transition};

/// Runs the stages of a [`LeadFlow`] strictly one after another.
///
/// Every API failure is recorded on its stage and the sequence moves on;
/// the run stops early only on cancellation or an illegal transition.
pub struct StageSequencer {
    api: Arc<dyn LeadApi>,
    pacing: PacingConfig,
    sink: Arc<dyn EventSink>,
    cancel: Arc<CancellationToken>,
}

impl StageSequencer {
    /// Creates a sequencer with no pacing and no event sink.
    #[must_use]
    pub fn new(api: Arc<dyn LeadApi>) -> Self {
        Self {
            api,
            pacing: PacingConfig::none(),
            sink: Arc::new(NoOpEventSink),
            cancel: Arc::new(CancellationToken::new()),
        }
    }

    /// Sets the delay inserted after each transition.
    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Shares an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// The API the sequencer calls.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn LeadApi> {
        &self.api
    }

    /// The event sink transitions are emitted to.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// The token that aborts a run.
    #[must_use]
    pub fn cancellation(&self) -> &Arc<CancellationToken> {
        &self.cancel
    }

    /// Runs every stage of a freshly created flow.
    ///
    /// Returns once the assignment stage is waiting for input. On
    /// cancellation the in-flight stage is left `running` and
    /// [`LeadflowError::Cancelled`] is returned.
    pub async fn run(&self, flow: &mut LeadFlow, lead: &LeadData) -> Result<(), LeadflowError> {
        let lead_id = flow.lead_id().to_string();
        info!(lead_id = %lead_id, flow_id = %flow.id(), "Starting lead automation");

        // The first stage is already running when the flow is created.
        if let Some(initial) = flow.history().first() {
            let event = FlowEvent::transition(&lead_id, initial.stage, initial.from, initial.to);
            self.sink.emit(&event).await;
        }

        for stage in StageKey::ALL {
            if stage != StageKey::RecordCreated {
                let event = flow.apply(Transition::Start(stage))?;
                self.sink.emit(&event).await;
            }
            self.pace().await?;

            let timer = SpanTimer::start(stage.as_str());
            let (outcome, cause) = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(self.cancelled(stage)),
                resolved = self.execute(stage, &lead_id, lead).instrument(stage_span(&lead_id, stage)) => resolved,
            };
            let duration_ms = timer.finish();

            let mut attrs = StageSpanAttributes::new(&lead_id, stage)
                .with_status(outcome.status())
                .with_duration_ms(duration_ms);
            if let StageOutcome::Error { ref message, .. } = outcome {
                attrs = attrs.with_error(message.clone());
            }
            debug!(attributes = ?attrs.to_fields(), "Stage resolved");

            let mut event = flow
                .apply(Transition::Resolve { stage, outcome })?
                .add_data("duration_ms", serde_json::json!(duration_ms));
            if let Some(cause) = cause {
                event = event.add_data("cause", serde_json::json!(cause.to_dict()));
            }
            self.sink.emit(&event).await;

            info!(
                lead_id = %lead_id,
                stage = stage.as_str(),
                status = %flow.status(stage),
                duration_ms,
                "Stage finished"
            );

            if !stage.is_interactive() {
                self.pace().await?;
            }
        }

        info!(
            lead_id = %lead_id,
            needs_attention = ?flow.stages_needing_attention(),
            "Lead automation halted for assignment"
        );
        Ok(())
    }

    /// Performs a stage's work. A failed call comes back as the stage's
    /// static error together with its cause.
    async fn execute(
        &self,
        stage: StageKey,
        lead_id: &str,
        lead: &LeadData,
    ) -> (StageOutcome, Option<ApiError>) {
        let result = match stage {
            StageKey::RecordCreated => {
                let payload = StagePayload::RecordCreated {
                    lead_id: lead_id.to_string(),
                };
                return (StageOutcome::Success(payload), None);
            }
            StageKey::DuplicateCheck => self
                .api
                .check_duplicates(&DuplicateCheckRequest::from(lead))
                .await
                .map(outcome::duplicate_check),
            StageKey::Enrichment => self.api.enrich(lead_id).await.map(outcome::enrichment),
            StageKey::Validation => self.api.validate(lead_id).await.map(outcome::validation),
            StageKey::Scoring => self.api.score(lead_id).await.map(outcome::scoring),
            StageKey::Assignment => return (StageOutcome::AwaitInput, None),
        };

        match result {
            Ok(outcome) => (outcome, None),
            Err(error) => {
                warn!(
                    lead_id,
                    stage = stage.as_str(),
                    endpoint = error.endpoint(),
                    error = %error,
                    "Lead API call failed"
                );
                (outcome::api_failure(stage), Some(error))
            }
        }
    }

    async fn pace(&self) -> Result<(), LeadflowError> {
        let Some(delay) = self.pacing.delay() else {
            return if self.cancel.is_cancelled() {
                Err(self.cancelled_reason())
            } else {
                Ok(())
            };
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(self.cancelled_reason()),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn cancelled(&self, stage: StageKey) -> LeadflowError {
        warn!(stage = stage.as_str(), "Lead automation cancelled mid-stage");
        self.cancelled_reason()
    }

    fn cancelled_reason(&self) -> LeadflowError {
        LeadflowError::Cancelled(
            self.cancel
                .reason()
                .unwrap_or_else(|| "cancelled".to_string()),
        )
    }
}

impl std::fmt::Debug for StageSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageSequencer")
            .field("pacing", &self.pacing)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        CheckResult, DuplicateCheckResponse, EnrichmentResponse, EnrichmentStatus, MockLeadApi,
        ScoreCard, ValidationResponse,
    };
    use crate::core::StageStatus;
    use crate::errors::ApiError;
    use crate::events::CollectingEventSink;
    use pretty_assertions::assert_eq;

    fn lead() -> LeadData {
        LeadData::new("Acme Textiles").with_email("ops@acme.example")
    }

    fn score_card() -> ScoreCard {
        ScoreCard {
            fit_score: 80.0,
            intent_score: 70.0,
            potential_score: 60.0,
            lead_score: 75.0,
            score_label: "Hot".to_string(),
        }
    }

    fn happy_api() -> MockLeadApi {
        let mut api = MockLeadApi::new();
        api.expect_check_duplicates()
            .times(1)
            .returning(|_| Ok(DuplicateCheckResponse::default()));
        api.expect_enrich().times(1).returning(|_| {
            Ok(EnrichmentResponse {
                enrichment_status: EnrichmentStatus::Completed,
                enriched_fields: serde_json::Map::new(),
            })
        });
        api.expect_validate().times(1).returning(|_| {
            Ok(ValidationResponse {
                validation_results: [("email".to_string(), CheckResult::Verified)]
                    .into_iter()
                    .collect(),
            })
        });
        api.expect_score().times(1).returning(|_| Ok(score_card()));
        api.expect_assign().never();
        api
    }

    #[tokio::test]
    async fn test_run_halts_at_assignment() {
        let sink = Arc::new(CollectingEventSink::new());
        let sequencer = StageSequencer::new(Arc::new(happy_api())).with_event_sink(sink.clone());
        let mut flow = LeadFlow::new("LEAD-001");

        sequencer.run(&mut flow, &lead()).await.unwrap();

        for stage in &StageKey::ALL[..5] {
            assert_eq!(flow.status(*stage), StageStatus::Success);
        }
        assert_eq!(flow.status(StageKey::Assignment), StageStatus::Manual);
        assert_eq!(flow.score().unwrap().score_label, "Hot");

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some("stage.started"));
        assert_eq!(types.last().map(String::as_str), Some("stage.awaiting_input"));
        // One start and one resolution per stage.
        assert_eq!(types.len(), 12);
    }

    #[tokio::test]
    async fn test_api_failures_become_stage_errors() {
        let mut api = MockLeadApi::new();
        api.expect_check_duplicates().returning(|_| {
            Err(ApiError::transport("POST /lead/duplicate-check", "connection refused"))
        });
        api.expect_enrich()
            .returning(|id| Err(ApiError::status(format!("POST /lead/{id}/enrich"), 502, "")));
        api.expect_validate()
            .returning(|id| Err(ApiError::decode(format!("POST /lead/{id}/validate"), "eof")));
        api.expect_score().returning(|id| {
            Err(ApiError::Timeout {
                endpoint: format!("POST /lead/{id}/score"),
            })
        });

        let sink = Arc::new(CollectingEventSink::new());
        let sequencer = StageSequencer::new(Arc::new(api)).with_event_sink(sink.clone());
        let mut flow = LeadFlow::new("LEAD-001");
        sequencer.run(&mut flow, &lead()).await.unwrap();

        let failed = sink.events_of_type("stage.failed");
        assert_eq!(failed.len(), 4);
        assert_eq!(failed[1].data["cause"]["type"], "status");
        assert_eq!(failed[1].data["cause"]["status"], 502);

        for stage in [
            StageKey::DuplicateCheck,
            StageKey::Enrichment,
            StageKey::Validation,
            StageKey::Scoring,
        ] {
            let state = flow.stage(stage);
            assert_eq!(state.status, StageStatus::Error);
            assert_eq!(state.error.as_deref(), Some(stage.failure_message()));
        }
        assert_eq!(flow.status(StageKey::Assignment), StageStatus::Manual);
        assert_eq!(
            flow.stages_needing_attention(),
            vec![
                StageKey::DuplicateCheck,
                StageKey::Enrichment,
                StageKey::Validation,
                StageKey::Scoring,
                StageKey::Assignment,
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_request_uses_lead_contact() {
        let mut api = MockLeadApi::new();
        api.expect_check_duplicates()
            .withf(|req| {
                req.company_name.as_deref() == Some("Acme Textiles")
                    && req.email.as_deref() == Some("ops@acme.example")
                    && req.phone.is_none()
            })
            .times(1)
            .returning(|_| Ok(DuplicateCheckResponse::default()));
        api.expect_enrich().returning(|_| Err(ApiError::transport("enrich", "down")));
        api.expect_validate().returning(|_| Ok(ValidationResponse::default()));
        api.expect_score().returning(|_| Ok(score_card()));

        let sequencer = StageSequencer::new(Arc::new(api));
        let mut flow = LeadFlow::new("LEAD-001");
        sequencer.run(&mut flow, &lead()).await.unwrap();
        assert_eq!(flow.status(StageKey::DuplicateCheck), StageStatus::Success);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let sequencer = StageSequencer::new(Arc::new(happy_api()));
        let mut flow = LeadFlow::new("LEAD-001");
        sequencer.run(&mut flow, &lead()).await.unwrap();

        let err = sequencer.run(&mut flow, &lead()).await.unwrap_err();
        assert!(matches!(err, LeadflowError::Transition(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = Arc::new(CancellationToken::new());
        token.cancel("session closed");
        let mut api = MockLeadApi::new();
        api.expect_check_duplicates().never();

        let sequencer = StageSequencer::new(Arc::new(api)).with_cancellation(token);
        let mut flow = LeadFlow::new("LEAD-001");
        let err = sequencer.run(&mut flow, &lead()).await.unwrap_err();

        assert!(matches!(err, LeadflowError::Cancelled(ref reason) if reason == "session closed"));
        assert_eq!(flow.status(StageKey::RecordCreated), StageStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delays_each_transition() {
        let sequencer = StageSequencer::new(Arc::new(happy_api()))
            .with_pacing(PacingConfig::fixed(100));
        let mut flow = LeadFlow::new("LEAD-001");

        let started = tokio::time::Instant::now();
        sequencer.run(&mut flow, &lead()).await.unwrap();

        // record_created: one delay before and one after resolving; every
        // later automated stage: one after start and one after resolving;
        // assignment: one after start.
        assert_eq!(started.elapsed(), std::time::Duration::from_millis(1100));
    }
}
