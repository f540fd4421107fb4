//! # Tickerdeck Core
//!
//! Data-access layer for the tickerdeck market dashboard: a request governor
//! that wraps one upstream market-data provider behind a small async API.
//!
//! ## Overview
//!
//! Dashboard widgets are chatty and the provider enforces a low per-minute
//! quota, so every upstream call goes through a [`RequestGovernor`] that:
//!
//! - dispatches strictly one request at a time, FIFO, with a minimum gap
//!   between dispatch starts
//! - collapses concurrent identical requests into one network call with the
//!   result fanned out to every caller
//! - caches parsed responses for a fixed window (lazy expiry)
//! - backs off exponentially while the provider signals rate limiting
//! - normalizes loose provider JSON into three fixed record shapes
//!
//! Public operations never fail from the caller's point of view: transport,
//! status, and parse errors are logged and absorbed into an empty result.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`backoff`] | Rate-limit lockout and escalating retry delay |
//! | [`cache`] | In-memory response cache with lazy expiry |
//! | [`config`] | Provider identity, credentials, declared quota |
//! | [`endpoint`] | Fixed endpoint catalog and cache-key derivation |
//! | [`error`] | Fetch and configuration error types |
//! | [`governor`] | The request governor and its dispatch policy |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`records`] | Normalized record shapes and tolerant decoding |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickerdeck_core::{ProviderConfig, RequestGovernor};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ProviderConfig::from_env().expect("TICKERDECK_API_KEY must be set");
//!     let governor = RequestGovernor::new(config);
//!
//!     if let Some(quote) = governor.quote("TCS").await {
//!         println!("{}: {:.2}", quote.symbol, quote.price);
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! The API key travels only in the `x-api-key` request header and is redacted
//! from `Debug` output. Replacing credentials means building a fresh governor
//! and dropping the old one; no shared mutable credential state exists.

pub mod backoff;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod governor;
pub mod http_client;
pub mod records;

pub use backoff::BackoffState;
pub use cache::ResponseCache;
pub use config::ProviderConfig;
pub use endpoint::{cache_key, Endpoint, Exchange};
pub use error::{ConfigError, GovernorError};
pub use governor::{GovernorPolicy, RequestGovernor, DEFAULT_PERIOD};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use records::{CardTag, HistoricalPoint, MarketCard, Quote};
