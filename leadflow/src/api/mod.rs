//! The remote lead API.
//!
//! The flow talks to the backend only through [`LeadApi`]. [`HttpLeadApi`]
//! is the production implementation; tests and offline demos use
//! [`crate::testing::ScriptedLeadApi`].

#[cfg(feature = "http")]
mod http;
#[cfg(all(test, feature = "http"))]
mod http_tests;
mod models;

#[cfg(feature = "http")]
pub use http::HttpLeadApi;
pub use models::{
    AssignmentPatch, CheckResult, DuplicateCheckRequest, DuplicateCheckResponse,
    EnrichmentResponse, EnrichmentStatus, FollowUpSla, LeadData, ScoreCard, ValidationResponse,
};

use async_trait::async_trait;

use crate::errors::ApiError;

/// Path prefix shared by every lead endpoint.
pub const LEAD_API_PREFIX: &str = "/api/commerce/lead";

/// Operations the lead-intake flow needs from the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadApi: Send + Sync {
    /// `POST /lead/duplicate-check`
    async fn check_duplicates(
        &self,
        request: &DuplicateCheckRequest,
    ) -> Result<DuplicateCheckResponse, ApiError>;

    /// `POST /lead/{id}/enrich`
    async fn enrich(&self, lead_id: &str) -> Result<EnrichmentResponse, ApiError>;

    /// `POST /lead/{id}/validate`
    async fn validate(&self, lead_id: &str) -> Result<ValidationResponse, ApiError>;

    /// `POST /lead/{id}/score`
    async fn score(&self, lead_id: &str) -> Result<ScoreCard, ApiError>;

    /// `PATCH /lead/{id}`
    async fn assign(&self, lead_id: &str, patch: &AssignmentPatch) -> Result<(), ApiError>;
}
