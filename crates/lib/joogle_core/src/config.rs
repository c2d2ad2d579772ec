//! Console configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::auth::jwt::resolve_signing_secret;

/// Default indexing API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/";

/// Default telemetry sampling period: 5 seconds.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;

/// Default bound of the telemetry history (one hour at the default period).
pub const DEFAULT_SAMPLE_HISTORY: usize = 720;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Connection settings for the owned-domains table (PostgREST).
#[derive(Clone, Debug)]
pub struct DomainStoreConfig {
    /// Project URL; the table lives under `rest/v1/domains`.
    pub url: Url,
    /// Public API key sent as `apikey` and bearer credential.
    pub api_key: String,
}

/// Configuration for the console core.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Base URL of the indexing/analytics API.
    pub api_url: Url,
    /// HS256 secret shared with the analytics service.
    pub signing_secret: String,
    /// Telemetry sampling period.
    pub sample_interval: Duration,
    /// Maximum number of raw telemetry samples kept in memory.
    pub sample_history: usize,
    /// Owned-domains table, when configured.
    pub domain_store: Option<DomainStoreConfig>,
}

impl ConsoleConfig {
    /// Config with defaults for everything but the signing secret.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("valid default URL"),
            signing_secret: signing_secret.into(),
            sample_interval: Duration::from_secs(DEFAULT_SAMPLE_INTERVAL_SECS),
            sample_history: DEFAULT_SAMPLE_HISTORY,
            domain_store: None,
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                         | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `JOOGLE_API_URL`                 | `http://localhost:8000/`   |
    /// | `JOOGLE_JWT_SECRET` / `JWT_SECRET` | required                 |
    /// | `JOOGLE_SAMPLE_INTERVAL_SECS`    | `5`                        |
    /// | `JOOGLE_SAMPLE_HISTORY`          | `720`                      |
    /// | `SUPABASE_URL` + `SUPABASE_KEY`  | no domain store            |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(resolve_signing_secret()?);

        if let Ok(raw) = std::env::var("JOOGLE_API_URL") {
            config.api_url = parse_base_url("JOOGLE_API_URL", &raw)?;
        }
        if let Ok(raw) = std::env::var("JOOGLE_SAMPLE_INTERVAL_SECS") {
            let secs: u64 = raw.parse().map_err(|e| ConfigError::Invalid {
                var: "JOOGLE_SAMPLE_INTERVAL_SECS",
                reason: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "JOOGLE_SAMPLE_INTERVAL_SECS",
                    reason: "must be at least 1".into(),
                });
            }
            config.sample_interval = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("JOOGLE_SAMPLE_HISTORY") {
            config.sample_history = raw.parse().map_err(|e| ConfigError::Invalid {
                var: "JOOGLE_SAMPLE_HISTORY",
                reason: format!("{e}"),
            })?;
        }
        if let (Ok(url), Ok(api_key)) = (std::env::var("SUPABASE_URL"), std::env::var("SUPABASE_KEY"))
        {
            config.domain_store = Some(DomainStoreConfig {
                url: parse_base_url("SUPABASE_URL", &url)?,
                api_key,
            });
        }

        Ok(config)
    }

    /// Override the API base URL.
    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = parse_base_url("api_url", raw)?;
        Ok(self)
    }
}

/// Parse a base URL, making sure it ends with `/` so `Url::join` keeps the path.
pub fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
