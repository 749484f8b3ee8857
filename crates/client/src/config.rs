use std::str::FromStr;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// backend on `localhost:8000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Seconds between import progress polls (default: `2`).
    pub poll_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            request_timeout_secs: 30,
            poll_interval_secs: 2,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// | Env Var                     | Default                          |
    /// |-----------------------------|----------------------------------|
    /// | `HRMS_API_URL`              | `http://localhost:8000/api/v1`   |
    /// | `HRMS_API_TOKEN`            | unset                            |
    /// | `HRMS_REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `HRMS_POLL_INTERVAL_SECS`   | `2`                              |
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` uses the process
    /// environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let defaults = Self::default();

        let api_url = lookup("HRMS_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);

        let api_token = lookup("HRMS_API_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let request_timeout_secs = parse_or(
            &lookup,
            "HRMS_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?;
        let poll_interval_secs =
            parse_or(&lookup, "HRMS_POLL_INTERVAL_SECS", defaults.poll_interval_secs)?;
        if poll_interval_secs == 0 {
            return Err(ClientError::Config(
                "HRMS_POLL_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            api_token,
            request_timeout_secs,
            poll_interval_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> ClientResult<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClientError::Config(format!("{key} must be a valid number, got '{raw}'"))),
    }
}
