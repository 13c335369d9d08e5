//! Configuration for the lead API client and stage pacing.
//!
//! Settings come from explicit construction, environment variables, or a
//! JSON file. Missing fields take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadflowConfig {
    /// Lead API client settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Stage pacing.
    #[serde(default)]
    pub pacing: PacingConfig,
}

impl LeadflowConfig {
    /// Loads configuration from environment variables.
    ///
    /// Variables:
    /// - `LEADFLOW_API_BASE_URL` (default: `http://localhost:8000`)
    /// - `LEADFLOW_API_TOKEN` (optional)
    /// - `LEADFLOW_TIMEOUT_SECS` (default: 30)
    /// - `LEADFLOW_STAGE_DELAY_MS` (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_error = |message: String| ConfigError::File {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))?;
        config.api.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("LEADFLOW_API_BASE_URL") {
            config.api.base_url = parse_base_url("LEADFLOW_API_BASE_URL", &raw)?;
        }
        if let Some(token) = lookup("LEADFLOW_API_TOKEN") {
            if !token.is_empty() {
                config.api.api_token = Some(token);
            }
        }
        if let Some(raw) = lookup("LEADFLOW_TIMEOUT_SECS") {
            config.api.timeout_secs = parse_number("LEADFLOW_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("LEADFLOW_STAGE_DELAY_MS") {
            config.pacing.stage_delay_ms = parse_number("LEADFLOW_STAGE_DELAY_MS", &raw)?;
        }

        config.api.validate()?;
        Ok(config)
    }
}

fn parse_number(var: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(var.to_string(), raw.to_string()))
}

/// Lead API client settings.
///
/// Custom `Debug` implementation redacts the `api_token` field.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, without the `/api/commerce` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds. Must be at least 1.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("BUG: hardcoded default base URL rejected by url parser")
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Creates a configuration for a base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL with a host.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("base_url", base_url)?,
            ..Self::default()
        })
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the base URL and the timeout.
    ///
    /// A zero timeout would expire every request before it is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_base_url("LEADFLOW_API_BASE_URL", &self.base_url)?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "LEADFLOW_TIMEOUT_SECS".to_string(),
                "0 (must be at least 1)".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(var.to_string(), format!("{raw}: {e}")))?;
    check_base_url(var, &url)?;
    Ok(url)
}

fn check_base_url(var: &str, url: &Url) -> Result<(), ConfigError> {
    let http = matches!(url.scheme(), "http" | "https");
    if http && url.has_host() && !url.cannot_be_a_base() {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl(
            var.to_string(),
            format!("{url}: expected an absolute http(s) URL"),
        ))
    }
}

/// Artificial delay between stage transitions.
///
/// The delay only paces progress for a watching operator; it has no effect
/// on stage ordering or outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay after each stage transition, in milliseconds. Zero disables pacing.
    #[serde(default)]
    pub stage_delay_ms: u64,
}

impl PacingConfig {
    /// No pacing.
    #[must_use]
    pub const fn none() -> Self {
        Self { stage_delay_ms: 0 }
    }

    /// A fixed delay after every transition.
    #[must_use]
    pub const fn fixed(stage_delay_ms: u64) -> Self {
        Self { stage_delay_ms }
    }

    /// Gets the delay as Duration, or `None` when pacing is off.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        (self.stage_delay_ms > 0).then(|| Duration::from_millis(self.stage_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LeadflowConfig::default();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert!(config.pacing.delay().is_none());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = LeadflowConfig::from_lookup(lookup(&[
            ("LEADFLOW_API_BASE_URL", "https://crm.example.com/"),
            ("LEADFLOW_API_TOKEN", "secret"),
            ("LEADFLOW_TIMEOUT_SECS", "5"),
            ("LEADFLOW_STAGE_DELAY_MS", "800"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url.as_str(), "https://crm.example.com/");
        assert_eq!(config.api.api_token.as_deref(), Some("secret"));
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.pacing.delay(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let err = LeadflowConfig::from_lookup(lookup(&[("LEADFLOW_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "LEADFLOW_TIMEOUT_SECS"));
    }

    #[test]
    fn test_from_lookup_rejects_bad_url() {
        let err = LeadflowConfig::from_lookup(lookup(&[("LEADFLOW_API_BASE_URL", "crm.local")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(..)));
    }

    #[test]
    fn test_malformed_host_is_rejected() {
        let err = ApiConfig::new("http://exa mple .com/ bad").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(..)));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        assert!(matches!(
            ApiConfig::new("ftp://crm.example.com").unwrap_err(),
            ConfigError::InvalidUrl(..)
        ));
        assert!(matches!(
            ApiConfig::new("mailto:ops@crm.example.com").unwrap_err(),
            ConfigError::InvalidUrl(..)
        ));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = ApiConfig::new("https://crm.example.com")
            .unwrap()
            .with_timeout_secs(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "LEADFLOW_TIMEOUT_SECS"));

        let err = LeadflowConfig::from_lookup(lookup(&[("LEADFLOW_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "LEADFLOW_TIMEOUT_SECS"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ApiConfig::new("https://crm.example.com")
            .unwrap()
            .with_token("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api": {{"base_url": "https://crm.example.com", "timeout_secs": 10}}, "pacing": {{"stage_delay_ms": 250}}}}"#
        )
        .unwrap();

        let config = LeadflowConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.api.api_token.is_none());
        assert_eq!(config.pacing, PacingConfig::fixed(250));
    }

    #[test]
    fn test_from_file_rejects_bad_settings() {
        let mut bad_url = tempfile::NamedTempFile::new().unwrap();
        write!(bad_url, r#"{{"api": {{"base_url": "crm dot local"}}}}"#).unwrap();
        assert!(matches!(
            LeadflowConfig::from_file(bad_url.path()).unwrap_err(),
            ConfigError::File { .. }
        ));

        let mut zero_timeout = tempfile::NamedTempFile::new().unwrap();
        write!(zero_timeout, r#"{{"api": {{"timeout_secs": 0}}}}"#).unwrap();
        assert!(matches!(
            LeadflowConfig::from_file(zero_timeout.path()).unwrap_err(),
            ConfigError::InvalidValue(..)
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let err = LeadflowConfig::from_file("/nonexistent/leadflow.json").unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }
}
