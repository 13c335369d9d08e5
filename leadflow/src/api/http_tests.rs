//! Contract tests for `HttpLeadApi` against a wiremock backend.

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::config::ApiConfig;

fn client(server: &MockServer) -> HttpLeadApi {
    let config = ApiConfig::new(&server.uri())
        .unwrap()
        .with_token("test-token")
        .with_timeout_secs(5);
    HttpLeadApi::new(&config).unwrap()
}

#[tokio::test]
async fn test_duplicate_check_sends_contact_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/duplicate-check"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({
            "company_name": "Acme Textiles",
            "email": "ops@acme.example",
            "phone": "+91 98765 43210"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "duplicates": [{"id": "LEAD-000"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lead = LeadData::new("Acme Textiles")
        .with_email("ops@acme.example")
        .with_phone("+91 98765 43210");
    let resp = client(&server)
        .check_duplicates(&DuplicateCheckRequest::from(&lead))
        .await
        .unwrap();

    assert_eq!(resp.duplicates, vec![serde_json::json!({"id": "LEAD-000"})]);
}

#[tokio::test]
async fn test_enrich_decodes_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/enrich"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "enrichment_status": "Partial",
            "enriched_fields": {"industry": "Textiles"}
        })))
        .mount(&server)
        .await;

    let resp = client(&server).enrich("LEAD-001").await.unwrap();
    assert_eq!(resp.enrichment_status, EnrichmentStatus::Partial);
    assert_eq!(resp.enriched_fields["industry"], "Textiles");
}

#[tokio::test]
async fn test_validate_decodes_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "validation_results": {"email": "Verified", "phone": "Warning"}
        })))
        .mount(&server)
        .await;

    let resp = client(&server).validate("LEAD-001").await.unwrap();
    assert_eq!(resp.validation_results["phone"], CheckResult::Warning);
}

#[tokio::test]
async fn test_score_decodes_card() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fit_score": 80,
            "intent_score": 70,
            "potential_score": 60,
            "lead_score": 75,
            "score_label": "Hot"
        })))
        .mount(&server)
        .await;

    let card = client(&server).score("LEAD-001").await.unwrap();
    assert_eq!(card.lead_score, 75.0);
    assert_eq!(card.score_label, "Hot");
}

#[tokio::test]
async fn test_assign_sends_patch() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/commerce/lead/LEAD-001"))
        .and(body_json(serde_json::json!({
            "assigned_to": "Priya Sharma",
            "follow_up_sla": "1_day",
            "assignment_note": "Call before noon"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let patch = AssignmentPatch {
        assigned_to: "Priya Sharma".to_string(),
        follow_up_sla: FollowUpSla::OneDay,
        assignment_note: Some("Call before noon".to_string()),
    };
    client(&server).assign("LEAD-001", &patch).await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/score"))
        .respond_with(ResponseTemplate::new(503).set_body_string("scoring offline"))
        .mount(&server)
        .await;

    let err = client(&server).score("LEAD-001").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::status("POST /lead/LEAD-001/score", 503, "scoring offline")
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lead_score": "high"
        })))
        .mount(&server)
        .await;

    let err = client(&server).score("LEAD-001").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/LEAD-001/enrich"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(3))
                .set_body_json(serde_json::json!({"enrichment_status": "Completed"})),
        )
        .mount(&server)
        .await;

    let config = ApiConfig::new(&server.uri()).unwrap().with_timeout_secs(1);
    let api = HttpLeadApi::new(&config).unwrap();
    let err = api.enrich("LEAD-001").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Timeout {
            endpoint: "POST /lead/LEAD-001/enrich".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let config = ApiConfig::new("http://127.0.0.1:9")
        .unwrap()
        .with_timeout_secs(2);
    let api = HttpLeadApi::new(&config).unwrap();

    let err = api.validate("LEAD-001").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. } | ApiError::Timeout { .. }));
}

#[test]
fn test_rejects_zero_timeout() {
    let config = ApiConfig::new("http://127.0.0.1:9")
        .unwrap()
        .with_timeout_secs(0);
    let err = HttpLeadApi::new(&config).unwrap_err();
    assert!(matches!(err, crate::errors::ConfigError::InvalidValue(..)));
}

#[tokio::test]
async fn test_lead_id_is_percent_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/duplicate-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/..%2Fduplicate-check%23/enrich"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "enrichment_status": "Completed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).enrich("../duplicate-check#").await.unwrap();
    assert_eq!(resp.enrichment_status, EnrichmentStatus::Completed);
}

#[tokio::test]
async fn test_lead_id_with_spaces_and_slashes() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/api/commerce/lead/ACME%2F42%20%237"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let patch = AssignmentPatch {
        assigned_to: "Priya Sharma".to_string(),
        follow_up_sla: FollowUpSla::FourHours,
        assignment_note: None,
    };
    client(&server).assign("ACME/42 #7", &patch).await.unwrap();
}

#[tokio::test]
async fn test_dot_lead_ids_never_reach_the_backend() {
    let server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server);
    for id in ["..", ".", ""] {
        let err = api.score(id).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }), "{id:?} gave {err:?}");
    }
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crm/api/commerce/lead/LEAD-001/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fit_score": 1,
            "intent_score": 2,
            "potential_score": 3,
            "lead_score": 2,
            "score_label": "Cold"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ApiConfig::new(&format!("{}/crm/", server.uri())).unwrap();
    let card = HttpLeadApi::new(&config).unwrap().score("LEAD-001").await.unwrap();
    assert_eq!(card.score_label, "Cold");
}

#[tokio::test]
async fn test_null_duplicates_are_no_duplicates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/commerce/lead/duplicate-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "duplicates": null
        })))
        .mount(&server)
        .await;

    let resp = client(&server)
        .check_duplicates(&DuplicateCheckRequest::from(&LeadData::new("Acme Textiles")))
        .await
        .unwrap();
    assert!(resp.duplicates.is_empty());
}
