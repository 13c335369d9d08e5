//! A scripted in-memory lead API.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::api::{
    AssignmentPatch, DuplicateCheckRequest, DuplicateCheckResponse, EnrichmentResponse,
    EnrichmentStatus, LeadApi, ScoreCard, ValidationResponse,
};
use crate::errors::ApiError;

use super::fixtures;

/// One recorded call to a [`ScriptedLeadApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// `POST /lead/duplicate-check`
    CheckDuplicates(DuplicateCheckRequest),
    /// `POST /lead/{id}/enrich`
    Enrich(String),
    /// `POST /lead/{id}/validate`
    Validate(String),
    /// `POST /lead/{id}/score`
    Score(String),
    /// `PATCH /lead/{id}`
    Assign(String, AssignmentPatch),
}

/// A [`LeadApi`] that answers from a script and records every call.
///
/// Each endpoint returns a fixed response until changed. Assignment calls
/// consume queued failures first and succeed once the queue is empty.
#[derive(Debug)]
pub struct ScriptedLeadApi {
    duplicates: Mutex<Result<DuplicateCheckResponse, ApiError>>,
    enrichment: Mutex<Result<EnrichmentResponse, ApiError>>,
    validation: Mutex<Result<ValidationResponse, ApiError>>,
    score: Mutex<Result<ScoreCard, ApiError>>,
    assign_failures: Mutex<VecDeque<ApiError>>,
    latency: Option<Duration>,
    calls: Mutex<Vec<ApiCall>>,
}

impl Default for ScriptedLeadApi {
    fn default() -> Self {
        Self::happy_path()
    }
}

impl ScriptedLeadApi {
    /// A backend on which every stage succeeds: no duplicates, completed
    /// enrichment, verified email and phone, and a hot score.
    #[must_use]
    pub fn happy_path() -> Self {
        Self {
            duplicates: Mutex::new(Ok(DuplicateCheckResponse::default())),
            enrichment: Mutex::new(Ok(fixtures::enrichment(
                EnrichmentStatus::Completed,
                &[("industry", "Textiles"), ("company_size", "50-200")],
            ))),
            validation: Mutex::new(Ok(fixtures::validation(&[
                ("email", "Verified"),
                ("phone", "Verified"),
            ]))),
            score: Mutex::new(Ok(fixtures::hot_score())),
            assign_failures: Mutex::new(VecDeque::new()),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delays every response.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Sets the duplicate-check matches.
    pub fn set_duplicates(&self, duplicates: Vec<serde_json::Value>) {
        *self.duplicates.lock() = Ok(DuplicateCheckResponse { duplicates });
    }

    /// Sets the enrichment response.
    pub fn set_enrichment(&self, response: EnrichmentResponse) {
        *self.enrichment.lock() = Ok(response);
    }

    /// Sets the validation response.
    pub fn set_validation(&self, response: ValidationResponse) {
        *self.validation.lock() = Ok(response);
    }

    /// Sets the score card.
    pub fn set_score(&self, card: ScoreCard) {
        *self.score.lock() = Ok(card);
    }

    /// Makes the duplicate check fail.
    pub fn fail_duplicates(&self, error: ApiError) {
        *self.duplicates.lock() = Err(error);
    }

    /// Makes enrichment fail.
    pub fn fail_enrich(&self, error: ApiError) {
        *self.enrichment.lock() = Err(error);
    }

    /// Makes validation fail.
    pub fn fail_validate(&self, error: ApiError) {
        *self.validation.lock() = Err(error);
    }

    /// Makes scoring fail.
    pub fn fail_score(&self, error: ApiError) {
        *self.score.lock() = Err(error);
    }

    /// Queues a failure for the next assignment call.
    pub fn fail_next_assign(&self, error: ApiError) {
        self.assign_failures.lock().push_back(error);
    }

    /// Every call so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Assignment bodies sent so far, including failed attempts.
    #[must_use]
    pub fn assignments(&self) -> Vec<AssignmentPatch> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::Assign(_, patch) => Some(patch.clone()),
                _ => None,
            })
            .collect()
    }

    async fn respond(&self, call: ApiCall) {
        self.calls.lock().push(call);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl LeadApi for ScriptedLeadApi {
    async fn check_duplicates(
        &self,
        request: &DuplicateCheckRequest,
    ) -> Result<DuplicateCheckResponse, ApiError> {
        self.respond(ApiCall::CheckDuplicates(request.clone())).await;
        self.duplicates.lock().clone()
    }

    async fn enrich(&self, lead_id: &str) -> Result<EnrichmentResponse, ApiError> {
        self.respond(ApiCall::Enrich(lead_id.to_string())).await;
        self.enrichment.lock().clone()
    }

    async fn validate(&self, lead_id: &str) -> Result<ValidationResponse, ApiError> {
        self.respond(ApiCall::Validate(lead_id.to_string())).await;
        self.validation.lock().clone()
    }

    async fn score(&self, lead_id: &str) -> Result<ScoreCard, ApiError> {
        self.respond(ApiCall::Score(lead_id.to_string())).await;
        self.score.lock().clone()
    }

    async fn assign(&self, lead_id: &str, patch: &AssignmentPatch) -> Result<(), ApiError> {
        self.respond(ApiCall::Assign(lead_id.to_string(), patch.clone()))
            .await;
        match self.assign_failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FollowUpSla;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let api = ScriptedLeadApi::happy_path();
        let request = DuplicateCheckRequest::from(&fixtures::sample_lead());

        api.check_duplicates(&request).await.unwrap();
        api.enrich("LEAD-001").await.unwrap();
        api.score("LEAD-001").await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::CheckDuplicates(request),
                ApiCall::Enrich("LEAD-001".to_string()),
                ApiCall::Score("LEAD-001".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let api = ScriptedLeadApi::happy_path();
        api.fail_validate(ApiError::transport("POST /lead/LEAD-001/validate", "reset"));

        assert!(api.validate("LEAD-001").await.is_err());
        assert_eq!(api.score("LEAD-001").await.unwrap().lead_score, 75.0);
    }

    #[tokio::test]
    async fn test_assign_failures_are_consumed() {
        let api = ScriptedLeadApi::happy_path();
        api.fail_next_assign(ApiError::status("PATCH /lead/LEAD-001", 503, ""));
        let patch = AssignmentPatch {
            assigned_to: "Priya Sharma".to_string(),
            follow_up_sla: FollowUpSla::OneDay,
            assignment_note: None,
        };

        assert!(api.assign("LEAD-001", &patch).await.is_err());
        assert!(api.assign("LEAD-001", &patch).await.is_ok());
        assert_eq!(api.assignments().len(), 2);
    }
}
