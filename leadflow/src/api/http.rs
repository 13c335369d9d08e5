//! HTTP implementation of the lead API over `reqwest`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{
    AssignmentPatch, DuplicateCheckRequest, DuplicateCheckResponse, EnrichmentResponse, LeadApi,
    ScoreCard, ValidationResponse, LEAD_API_PREFIX,
};
use crate::config::ApiConfig;
use crate::errors::{ApiError, ConfigError};

/// Lead API client for the commerce backend.
#[derive(Debug, Clone)]
pub struct HttpLeadApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpLeadApi {
    /// Creates a client from configuration.
    ///
    /// The bearer token, when present, is sent as a default header on every
    /// request.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(ref token) = config.api_token {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| {
                    ConfigError::InvalidValue("LEADFLOW_API_TOKEN".to_string(), "[REDACTED]".to_string())
                })?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidValue("http client".to_string(), e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Builds an endpoint URL under the lead prefix.
    ///
    /// Each segment is percent-encoded on its own, so a lead id can never
    /// reach a different endpoint. Dot segments are refused outright.
    fn url(&self, endpoint: &str, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::transport(
                endpoint,
                format!("'{bad}' is not a usable lead id"),
            ));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::transport(endpoint, "base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(LEAD_API_PREFIX.split('/').filter(|s| !s.is_empty()))
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        debug!(endpoint, "Sending lead API request");

        let resp = request.send().await.map_err(|e| transport_error(endpoint, &e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::status(endpoint, status, body));
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = self.send(endpoint, request).await?;
        resp.json()
            .await
            .map_err(|e| ApiError::decode(endpoint, e.to_string()))
    }
}

fn transport_error(endpoint: &str, error: &reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        ApiError::transport(endpoint, error.to_string())
    }
}

#[async_trait]
impl LeadApi for HttpLeadApi {
    async fn check_duplicates(
        &self,
        request: &DuplicateCheckRequest,
    ) -> Result<DuplicateCheckResponse, ApiError> {
        let endpoint = "POST /lead/duplicate-check";
        let url = self.url(endpoint, &["duplicate-check"])?;
        self.send_json(endpoint, self.http.post(url).json(request))
            .await
    }

    async fn enrich(&self, lead_id: &str) -> Result<EnrichmentResponse, ApiError> {
        let endpoint = format!("POST /lead/{lead_id}/enrich");
        let url = self.url(&endpoint, &[lead_id, "enrich"])?;
        self.send_json(&endpoint, self.http.post(url)).await
    }

    async fn validate(&self, lead_id: &str) -> Result<ValidationResponse, ApiError> {
        let endpoint = format!("POST /lead/{lead_id}/validate");
        let url = self.url(&endpoint, &[lead_id, "validate"])?;
        self.send_json(&endpoint, self.http.post(url)).await
    }

    async fn score(&self, lead_id: &str) -> Result<ScoreCard, ApiError> {
        let endpoint = format!("POST /lead/{lead_id}/score");
        let url = self.url(&endpoint, &[lead_id, "score"])?;
        self.send_json(&endpoint, self.http.post(url)).await
    }

    async fn assign(&self, lead_id: &str, patch: &AssignmentPatch) -> Result<(), ApiError> {
        let endpoint = format!("PATCH /lead/{lead_id}");
        let url = self.url(&endpoint, &[lead_id])?;
        self.send(&endpoint, self.http.patch(url).json(patch)).await?;
        Ok(())
    }
}
