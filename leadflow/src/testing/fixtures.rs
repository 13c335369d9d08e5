//! Fixtures for lead data and API responses.

use serde_json::{Map, Value};

use crate::api::{
    CheckResult, EnrichmentResponse, EnrichmentStatus, LeadData, ScoreCard, ValidationResponse,
};

/// A lead with all contact fields set.
#[must_use]
pub fn sample_lead() -> LeadData {
    LeadData::new("Acme Textiles")
        .with_email("ops@acme.example")
        .with_phone("+91 98765 43210")
}

/// The score card of a hot lead: 80/70/60, overall 75.
#[must_use]
pub fn hot_score() -> ScoreCard {
    ScoreCard {
        fit_score: 80.0,
        intent_score: 70.0,
        potential_score: 60.0,
        lead_score: 75.0,
        score_label: "Hot".to_string(),
    }
}

/// A duplicate-check match.
#[must_use]
pub fn duplicate(id: &str, company_name: &str) -> Value {
    serde_json::json!({ "id": id, "company_name": company_name })
}

/// An enrichment response with the given status and fields.
#[must_use]
pub fn enrichment(status: EnrichmentStatus, fields: &[(&str, &str)]) -> EnrichmentResponse {
    let enriched_fields: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
        .collect();
    EnrichmentResponse {
        enrichment_status: status,
        enriched_fields,
    }
}

/// A validation response from `(check, result)` pairs. Results are parsed as
/// they would be off the wire, so unknown values stay unrecognised.
#[must_use]
pub fn validation(checks: &[(&str, &str)]) -> ValidationResponse {
    ValidationResponse {
        validation_results: checks
            .iter()
            .map(|(k, v)| ((*k).to_string(), CheckResult::from((*v).to_string())))
            .collect(),
    }
}
