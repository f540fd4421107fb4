//! Provider configuration.
//!
//! A [`ProviderConfig`] is owned by whichever collaborator manages
//! credentials. When the key changes the collaborator builds a fresh
//! [`crate::RequestGovernor`] around a new config and drops the old one;
//! there is no in-place mutation of a live governor.

use std::fmt::{Debug, Formatter};

use crate::error::ConfigError;

const API_KEY_ENV: &str = "TICKERDECK_API_KEY";
const BASE_URL_ENV: &str = "TICKERDECK_BASE_URL";
const PROVIDER_ENV: &str = "TICKERDECK_PROVIDER";
const RATE_LIMIT_ENV: &str = "TICKERDECK_RATE_LIMIT";

const DEFAULT_PROVIDER: &str = "indianapi";
const DEFAULT_BASE_URL: &str = "https://stock.indianapi.in";
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;

/// Upstream provider identity and credentials.
///
/// `rate_limit_per_minute` is the provider's declared quota and is carried
/// for display purposes only; the governor's actual spacing and backoff come
/// from [`crate::GovernorPolicy`].
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: String,
    pub base_url: String,
    pub rate_limit_per_minute: u32,
    api_key: String,
}

impl ProviderConfig {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        rate_limit_per_minute: u32,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            provider: provider.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            rate_limit_per_minute,
            api_key: api_key.into(),
        }
    }

    /// Build a config from environment variables, defaulting everything but
    /// the API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey {
                env_var: API_KEY_ENV,
            })?;

        let provider =
            std::env::var(PROVIDER_ENV).unwrap_or_else(|_| DEFAULT_PROVIDER.to_owned());
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        let rate_limit_per_minute = match std::env::var(RATE_LIMIT_ENV) {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidRateLimit { value: raw })?,
            Err(_) => DEFAULT_RATE_LIMIT_PER_MINUTE,
        };

        Ok(Self::new(provider, base_url, api_key, rate_limit_per_minute))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let config = ProviderConfig::new("indianapi", "https://stock.indianapi.in/", "key", 30);
        assert_eq!(config.base_url, "https://stock.indianapi.in");
    }

    #[test]
    fn debug_output_redacts_the_api_key() {
        let config = ProviderConfig::new("indianapi", "https://stock.indianapi.in", "sk-secret", 30);
        let rendered = format!("{config:?}");

        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("sk-secret"));
    }
}
