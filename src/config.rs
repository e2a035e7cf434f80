//! Process configuration, read once at startup.

use std::env;
use std::time::Duration;
use thiserror::Error;

pub const API_KEY_VAR: &str = "IPIFY_API_KEY";
/// Name the browser build used for the same key.
pub const LEGACY_API_KEY_VAR: &str = "VITE_IPIFY_API_KEY";

pub const DEFAULT_GEOLOCATION_URL: &str = "https://geo.ipify.org/api/v2/country,city";
pub const DEFAULT_COUNTRY_URL: &str = "https://restcountries.com/v3.1/alpha";
pub const DEFAULT_PLACE_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing geolocation API key. Set IPIFY_API_KEY in the environment.")]
    MissingApiKey,
    #[error("Invalid GEOSCOPE_TIMEOUT_SECS '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Service endpoints, credentials and request limits.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub geolocation_url: String,
    /// Base URL; the country code is appended as a path segment.
    pub country_url: String,
    pub place_search_url: String,
    /// Per-request timeout. `None` waits as long as the upstream takes.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank(API_KEY_VAR)
            .or_else(|| non_blank(LEGACY_API_KEY_VAR))
            .ok_or(ConfigError::MissingApiKey)?;

        let timeout = match non_blank("GEOSCOPE_TIMEOUT_SECS") {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            api_key: api_key.trim().to_string(),
            geolocation_url: non_blank("GEOSCOPE_GEO_URL")
                .unwrap_or_else(|| DEFAULT_GEOLOCATION_URL.to_string()),
            country_url: non_blank("GEOSCOPE_COUNTRY_URL")
                .unwrap_or_else(|| DEFAULT_COUNTRY_URL.to_string()),
            place_search_url: non_blank("GEOSCOPE_PLACE_URL")
                .unwrap_or_else(|| DEFAULT_PLACE_SEARCH_URL.to_string()),
            timeout,
        })
    }

    /// Override the request timeout (e.g. from a CLI flag).
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
