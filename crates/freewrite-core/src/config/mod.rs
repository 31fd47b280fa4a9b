//! Client configuration for the journal service and the sync schedule.
//!
//! Defaults match a local development server; every value can be overridden
//! through `FREEWRITE_*` environment variables.

use std::env;
use std::time::Duration;

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
/// Number of remote records fetched by one pull.
pub const DEFAULT_PULL_LIMIT: usize = 1000;

const ENV_API_URL: &str = "FREEWRITE_API_URL";
const ENV_REQUEST_TIMEOUT: &str = "FREEWRITE_REQUEST_TIMEOUT_SECS";
const ENV_TRANSFER_TIMEOUT: &str = "FREEWRITE_TRANSFER_TIMEOUT_SECS";
const ENV_SYNC_INTERVAL: &str = "FREEWRITE_SYNC_INTERVAL_SECS";

/// Settings shared by the journal service client and the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the journal API, e.g. `http://localhost:8000/api`
    pub api_base_url: String,
    /// Connect timeout for a single request
    pub request_timeout: Duration,
    /// Upper bound for a whole request including the response body
    pub transfer_timeout: Duration,
    /// Period of the automatic full sync
    pub sync_interval: Duration,
    /// Number of remote records fetched by a pull
    pub pull_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            transfer_timeout: Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT_SECS),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            pull_limit: DEFAULT_PULL_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        parse_config(|key| env::var(key).ok())
    }

    /// Replace the API base URL after validating it.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.api_base_url = normalize_api_url(url.into())?;
        Ok(self)
    }
}

fn parse_config<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
        config.api_base_url = normalize_api_url(url)?;
    }
    if let Some(secs) = parse_seconds(&lookup, ENV_REQUEST_TIMEOUT)? {
        config.request_timeout = secs;
    }
    if let Some(secs) = parse_seconds(&lookup, ENV_TRANSFER_TIMEOUT)? {
        config.transfer_timeout = secs;
    }
    if let Some(secs) = parse_seconds(&lookup, ENV_SYNC_INTERVAL)? {
        config.sync_interval = secs;
    }

    Ok(config)
}

fn parse_seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = normalize_text_option(lookup(key)) else {
        return Ok(None);
    };

    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => Err(Error::InvalidInput(format!(
            "{key} must be a positive number of seconds, got '{raw}'"
        ))),
    }
}

fn normalize_api_url(raw: String) -> Result<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("API URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(format!(
            "API URL must include http:// or https://, got '{url}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup_from(values: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values = values
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<HashMap<_, _>>();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = parse_config(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.transfer_timeout, Duration::from_secs(60));
        assert_eq!(config.sync_interval, Duration::from_secs(300));
        assert_eq!(config.pull_limit, 1000);
    }

    #[test]
    fn reads_overrides_and_trims_trailing_slash() {
        let config = parse_config(lookup_from(&[
            (ENV_API_URL, " https://journal.example.com/api/ "),
            (ENV_REQUEST_TIMEOUT, "10"),
            (ENV_TRANSFER_TIMEOUT, "20"),
            (ENV_SYNC_INTERVAL, "60"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://journal.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.transfer_timeout, Duration::from_secs(20));
        assert_eq!(config.sync_interval, Duration::from_secs(60));
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = parse_config(lookup_from(&[(ENV_API_URL, "  "), (ENV_SYNC_INTERVAL, "")]))
            .unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn rejects_url_without_scheme() {
        let error = parse_config(lookup_from(&[(ENV_API_URL, "journal.example.com/api")]))
            .unwrap_err();
        assert!(error.to_string().contains("http:// or https://"));
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(parse_config(lookup_from(&[(ENV_SYNC_INTERVAL, "0")])).is_err());
        assert!(parse_config(lookup_from(&[(ENV_REQUEST_TIMEOUT, "soon")])).is_err());
    }

    #[test]
    fn with_api_base_url_validates() {
        let config = ClientConfig::default()
            .with_api_base_url("http://127.0.0.1:9000/api/")
            .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/api");
        assert!(ClientConfig::default().with_api_base_url("").is_err());
    }
}
