//! Request and response schemas for the lead API.
//!
//! Every response is decoded into an explicit type at the boundary. Collection
//! fields the backend may omit or send as `null` decode as empty; enum-like
//! string fields keep unrecognised values instead of failing to decode, so
//! the flow can decide what an unknown value means.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Contact data for the lead under intake, used by the duplicate check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadData {
    /// Company name.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

impl LeadData {
    /// Creates lead data from a company name.
    #[must_use]
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: Some(company_name.into()),
            ..Self::default()
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Body of `POST /lead/duplicate-check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCheckRequest {
    /// Company name.
    pub company_name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
}

impl From<&LeadData> for DuplicateCheckRequest {
    fn from(lead: &LeadData) -> Self {
        Self {
            company_name: lead.company_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response of `POST /lead/duplicate-check`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheckResponse {
    /// Matching leads. Missing, `null` and empty mean the same thing.
    #[serde(default, deserialize_with = "null_as_default")]
    pub duplicates: Vec<serde_json::Value>,
}

/// Outcome reported by the enrichment endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnrichmentStatus {
    /// All fields were filled.
    Completed,
    /// Some fields were filled.
    Partial,
    /// Any other value the backend sent.
    Unrecognized(String),
}

impl From<String> for EnrichmentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Completed" => Self::Completed,
            "Partial" => Self::Partial,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<EnrichmentStatus> for String {
    fn from(status: EnrichmentStatus) -> Self {
        match status {
            EnrichmentStatus::Completed => "Completed".to_string(),
            EnrichmentStatus::Partial => "Partial".to_string(),
            EnrichmentStatus::Unrecognized(value) => value,
        }
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("Completed"),
            Self::Partial => f.write_str("Partial"),
            Self::Unrecognized(value) => f.write_str(value),
        }
    }
}

/// Response of `POST /lead/{id}/enrich`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResponse {
    /// Overall enrichment outcome.
    pub enrichment_status: EnrichmentStatus,
    /// Fields the enrichment provider filled in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub enriched_fields: serde_json::Map<String, serde_json::Value>,
}

/// Result of a single named validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CheckResult {
    /// The check passed.
    Verified,
    /// The check was inconclusive.
    Warning,
    /// The check failed.
    Failed,
    /// Any other value the backend sent.
    Unrecognized(String),
}

impl From<String> for CheckResult {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Verified" => Self::Verified,
            "Warning" => Self::Warning,
            "Failed" => Self::Failed,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<CheckResult> for String {
    fn from(result: CheckResult) -> Self {
        match result {
            CheckResult::Verified => "Verified".to_string(),
            CheckResult::Warning => "Warning".to_string(),
            CheckResult::Failed => "Failed".to_string(),
            CheckResult::Unrecognized(value) => value,
        }
    }
}

/// Response of `POST /lead/{id}/validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    /// Named checks and their results.
    #[serde(default, deserialize_with = "null_as_default")]
    pub validation_results: BTreeMap<String, CheckResult>,
}

/// Response of `POST /lead/{id}/score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// How well the company matches the ideal customer profile.
    pub fit_score: f64,
    /// Buying-intent signal strength.
    pub intent_score: f64,
    /// Estimated deal potential.
    pub potential_score: f64,
    /// Overall score.
    pub lead_score: f64,
    /// Bucket label, e.g. `Hot`.
    pub score_label: String,
}

/// Follow-up window promised to the lead after assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowUpSla {
    /// Within four hours.
    #[serde(rename = "4_hours")]
    FourHours,
    /// Within one day.
    #[serde(rename = "1_day")]
    OneDay,
    /// Within two days.
    #[serde(rename = "2_days")]
    TwoDays,
    /// Within one week.
    #[serde(rename = "1_week")]
    OneWeek,
}

impl Default for FollowUpSla {
    fn default() -> Self {
        Self::FourHours
    }
}

impl FollowUpSla {
    /// All windows, shortest first.
    pub const ALL: [Self; 4] = [Self::FourHours, Self::OneDay, Self::TwoDays, Self::OneWeek];

    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FourHours => "4_hours",
            Self::OneDay => "1_day",
            Self::TwoDays => "2_days",
            Self::OneWeek => "1_week",
        }
    }

    /// Label shown to the operator.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FourHours => "4 hours",
            Self::OneDay => "1 day",
            Self::TwoDays => "2 days",
            Self::OneWeek => "1 week",
        }
    }

    /// Length of the window.
    #[must_use]
    pub fn window(self) -> chrono::Duration {
        match self {
            Self::FourHours => chrono::Duration::hours(4),
            Self::OneDay => chrono::Duration::days(1),
            Self::TwoDays => chrono::Duration::days(2),
            Self::OneWeek => chrono::Duration::weeks(1),
        }
    }
}

impl fmt::Display for FollowUpSla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for FollowUpSla {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sla| sla.as_str() == s || sla.label() == s)
            .ok_or_else(|| format!("unknown follow-up SLA '{s}'"))
    }
}

/// Body of `PATCH /lead/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPatch {
    /// Owner the lead is assigned to.
    pub assigned_to: String,
    /// Promised follow-up window.
    pub follow_up_sla: FollowUpSla,
    /// Free-text note for the owner.
    pub assignment_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicates_default_to_empty() {
        let resp: DuplicateCheckResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.duplicates.is_empty());
    }

    #[test]
    fn test_null_collections_decode_as_empty() {
        let resp: DuplicateCheckResponse =
            serde_json::from_str(r#"{"duplicates": null}"#).unwrap();
        assert!(resp.duplicates.is_empty());

        let resp: EnrichmentResponse = serde_json::from_str(
            r#"{"enrichment_status": "Completed", "enriched_fields": null}"#,
        )
        .unwrap();
        assert_eq!(resp.enrichment_status, EnrichmentStatus::Completed);
        assert!(resp.enriched_fields.is_empty());

        let resp: ValidationResponse =
            serde_json::from_str(r#"{"validation_results": null}"#).unwrap();
        assert!(resp.validation_results.is_empty());
    }

    #[test]
    fn test_wrong_collection_type_still_fails() {
        let result = serde_json::from_str::<DuplicateCheckResponse>(r#"{"duplicates": "none"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enrichment_status_keeps_unknown_values() {
        let resp: EnrichmentResponse =
            serde_json::from_str(r#"{"enrichment_status": "Queued"}"#).unwrap();
        assert_eq!(
            resp.enrichment_status,
            EnrichmentStatus::Unrecognized("Queued".to_string())
        );
        assert!(resp.enriched_fields.is_empty());
    }

    #[test]
    fn test_validation_results_decode() {
        let resp: ValidationResponse = serde_json::from_str(
            r#"{"validation_results": {"email": "Verified", "phone": "Failed", "gst": "Pending"}}"#,
        )
        .unwrap();
        assert_eq!(resp.validation_results["email"], CheckResult::Verified);
        assert_eq!(resp.validation_results["phone"], CheckResult::Failed);
        assert_eq!(
            resp.validation_results["gst"],
            CheckResult::Unrecognized("Pending".to_string())
        );
    }

    #[test]
    fn test_follow_up_sla_wire_values() {
        assert_eq!(serde_json::to_string(&FollowUpSla::OneDay).unwrap(), r#""1_day""#);
        assert_eq!("2_days".parse::<FollowUpSla>(), Ok(FollowUpSla::TwoDays));
        assert_eq!("1 week".parse::<FollowUpSla>(), Ok(FollowUpSla::OneWeek));
        assert_eq!(FollowUpSla::default(), FollowUpSla::FourHours);
        assert_eq!(FollowUpSla::OneDay.window(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_assignment_patch_body() {
        let patch = AssignmentPatch {
            assigned_to: "Priya Sharma".to_string(),
            follow_up_sla: FollowUpSla::OneDay,
            assignment_note: None,
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "assigned_to": "Priya Sharma",
                "follow_up_sla": "1_day",
                "assignment_note": null
            })
        );
    }
}
