use thiserror::Error;

/// Failure of a single dispatched fetch.
///
/// Cloneable so the dispatcher can fan the same failure out to every caller
/// joined on a deduplicated request. None of these reach the public
/// operations' callers; the operations absorb them into empty results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GovernorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("provider rate limit hit")]
    RateLimited,

    #[error("failed to parse provider response: {0}")]
    Parse(String),

    #[error("request dropped before completion")]
    Dropped,
}

impl GovernorError {
    /// Whether this failure should advance the rate-limit backoff state.
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Configuration errors detected before a governor is constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API key (set {env_var})")]
    MissingApiKey { env_var: &'static str },

    #[error("invalid rate limit '{value}', expected a positive integer")]
    InvalidRateLimit { value: String },
}
