//! The request governor: throttled, cached, deduplicating access to the
//! upstream provider.
//!
//! One governor instance owns a response cache, an in-flight registry, a
//! FIFO dispatch queue, and rate-limit backoff state. All network traffic
//! for the instance flows through a single dispatcher task, so at most one
//! upstream call is in flight at any moment and successive dispatches are
//! separated by at least the configured minimum spacing.
//!
//! A governor is disposable: when credentials change, build a fresh instance
//! around the new [`ProviderConfig`] and drop the old one. Dropping the
//! instance closes the queue and ends the dispatcher task.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::backoff::BackoffState;
use crate::cache::ResponseCache;
use crate::config::ProviderConfig;
use crate::endpoint::{cache_key, Endpoint, Exchange};
use crate::error::GovernorError;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::records::{
    cards_from_most_active, cards_from_trending, points_from_historical, HistoricalPoint,
    MarketCard, Quote,
};

const API_KEY_HEADER: &str = "x-api-key";

/// Period used by [`RequestGovernor::historical`] when the caller passes
/// `None`.
pub const DEFAULT_PERIOD: &str = "1yr";

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;
type FetchOutcome = Result<Value, GovernorError>;

/// Fixed throttling and caching policy for one governor instance.
///
/// The provider's declared quota in [`ProviderConfig`] is informational;
/// these are the constants the governor actually enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorPolicy {
    /// Minimum gap between successive dispatch starts.
    pub min_spacing: Duration,
    /// Validity window for cached responses.
    pub cache_ttl: Duration,
    /// Initial rate-limit lockout, doubled per consecutive 429.
    pub backoff_floor: Duration,
    /// Upper bound on the escalating lockout.
    pub backoff_ceiling: Duration,
}

impl Default for GovernorPolicy {
    fn default() -> Self {
        Self {
            min_spacing: Duration::from_secs(2),
            cache_ttl: Duration::from_secs(60),
            backoff_floor: Duration::from_secs(2),
            backoff_ceiling: Duration::from_secs(60),
        }
    }
}

struct QueueItem {
    key: String,
    generation: u64,
    request: HttpRequest,
}

/// One registered fetch. The generation ties a queued dispatch to the exact
/// registration it was enqueued for: after `clear_cache`, a re-request for
/// the same key registers under a fresh generation, and the stale dispatch's
/// completion no longer matches.
struct InFlight {
    generation: u64,
    waiters: Vec<oneshot::Sender<FetchOutcome>>,
}

/// Cache and in-flight registry, kept behind one lock so a miss and the
/// registration that follows it are a single atomic step.
struct SharedState {
    cache: ResponseCache,
    in_flight: HashMap<String, InFlight>,
    next_generation: u64,
}

/// Throttled, cached, deduplicating client for the market-data provider.
///
/// Every public operation is terminal: failures are logged and absorbed into
/// an empty result, never surfaced to the caller.
pub struct RequestGovernor {
    config: ProviderConfig,
    state: Arc<Mutex<SharedState>>,
    backoff: Arc<Mutex<BackoffState>>,
    queue: mpsc::UnboundedSender<QueueItem>,
}

impl RequestGovernor {
    /// Governor over the production reqwest transport with default policy.
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ProviderConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_policy(config, http_client, GovernorPolicy::default())
    }

    /// Full constructor; spawns the dispatcher task on the current runtime.
    pub fn with_policy(
        config: ProviderConfig,
        http_client: Arc<dyn HttpClient>,
        policy: GovernorPolicy,
    ) -> Self {
        let state = Arc::new(Mutex::new(SharedState {
            cache: ResponseCache::new(policy.cache_ttl),
            in_flight: HashMap::new(),
            next_generation: 0,
        }));
        let backoff = Arc::new(Mutex::new(BackoffState::new(
            policy.backoff_floor,
            policy.backoff_ceiling,
        )));
        let limiter = Arc::new(RateLimiter::direct(spacing_quota(policy.min_spacing)));

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(
            rx,
            http_client,
            Arc::clone(&state),
            Arc::clone(&backoff),
            limiter,
        ));

        Self {
            config,
            state,
            backoff,
            queue: tx,
        }
    }

    // -- public operations --------------------------------------------------

    /// Quote for a single symbol; `None` when the fetch fails outright.
    pub async fn quote(&self, symbol: &str) -> Option<Quote> {
        let params = [("name", symbol.to_owned())];
        match self.fetch(Endpoint::Stock, &params).await {
            Ok(payload) => Some(Quote::from_provider(&payload, symbol)),
            Err(error) => {
                warn!(symbol, %error, "quote fetch failed");
                None
            }
        }
    }

    /// Top gainers followed by top losers.
    pub async fn trending(&self) -> Vec<MarketCard> {
        match self.fetch(Endpoint::Trending, &[]).await {
            Ok(payload) => cards_from_trending(&payload),
            Err(error) => {
                warn!(%error, "trending fetch failed");
                Vec::new()
            }
        }
    }

    /// Most-active listing for the given exchange.
    pub async fn most_active(&self, exchange: Exchange) -> Vec<MarketCard> {
        match self.fetch(exchange.most_active_endpoint(), &[]).await {
            Ok(payload) => cards_from_most_active(&payload),
            Err(error) => {
                warn!(?exchange, %error, "most-active fetch failed");
                Vec::new()
            }
        }
    }

    /// Historical price series, oldest point first. `period` defaults to
    /// `"1yr"` when not given.
    pub async fn historical(&self, symbol: &str, period: Option<&str>) -> Vec<HistoricalPoint> {
        let period = period.unwrap_or(DEFAULT_PERIOD);
        let params = [
            ("stock_name", symbol.to_owned()),
            ("period", period.to_owned()),
            ("filter", String::from("price")),
        ];
        match self.fetch(Endpoint::HistoricalData, &params).await {
            Ok(payload) => points_from_historical(&payload),
            Err(error) => {
                warn!(symbol, period, %error, "historical fetch failed");
                Vec::new()
            }
        }
    }

    /// Drop all cache entries and in-flight registrations, and reset backoff
    /// to no lockout at the floor delay.
    ///
    /// Callers waiting on a dropped in-flight registration observe the fetch
    /// as failed and resolve to an empty result; a dispatch completing after
    /// the clear is discarded instead of repopulating the cache.
    pub fn clear_cache(&self) {
        let mut state = self
            .state
            .lock()
            .expect("governor state should not be poisoned");
        state.cache.clear();
        state.in_flight.clear();
        drop(state);

        self.backoff
            .lock()
            .expect("backoff state should not be poisoned")
            .reset();
        debug!("governor cache and backoff cleared");
    }

    /// Entry count of the response cache, stale entries included.
    pub fn cache_len(&self) -> usize {
        self.state
            .lock()
            .expect("governor state should not be poisoned")
            .cache
            .len()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    // -- internals ----------------------------------------------------------

    /// Cache-and-dedup front door for every fetch-capable operation.
    async fn fetch(&self, endpoint: Endpoint, params: &[(&str, String)]) -> FetchOutcome {
        let key = cache_key(endpoint, params);

        let rx = {
            let mut state = self
                .state
                .lock()
                .expect("governor state should not be poisoned");

            if let Some(payload) = state.cache.get(&key) {
                debug!(%key, "cache hit");
                return Ok(payload);
            }

            let (tx, rx) = oneshot::channel();
            if let Some(in_flight) = state.in_flight.get_mut(&key) {
                debug!(%key, "joining in-flight request");
                in_flight.waiters.push(tx);
            } else {
                let generation = state.next_generation;
                state.next_generation += 1;
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        generation,
                        waiters: vec![tx],
                    },
                );
                let request = self.build_request(endpoint, params);
                if self
                    .queue
                    .send(QueueItem {
                        key: key.clone(),
                        generation,
                        request,
                    })
                    .is_err()
                {
                    // dispatcher is gone; unwind the registration
                    state.in_flight.remove(&key);
                    return Err(GovernorError::Dropped);
                }
                debug!(%key, "enqueued fetch");
            }
            rx
        };

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(GovernorError::Dropped),
        }
    }

    fn build_request(&self, endpoint: Endpoint, params: &[(&str, String)]) -> HttpRequest {
        let mut url = format!("{}{}", self.config.base_url, endpoint.path());
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        HttpRequest::get(url).with_header(API_KEY_HEADER, self.config.api_key())
    }
}

/// One permit per `min_spacing`, burst of one: the limiter's only job is to
/// hold successive dispatch starts apart.
fn spacing_quota(min_spacing: Duration) -> Quota {
    let period = min_spacing.max(Duration::from_millis(1));
    Quota::with_period(period)
        .expect("spacing period is always greater than zero")
        .allow_burst(NonZeroU32::new(1).expect("burst of one is non-zero"))
}

/// Single dispatcher per governor instance. Items run strictly one at a
/// time in enqueue order; the loop ends when the governor (the only sender)
/// is dropped.
async fn dispatch_loop(
    mut queue: mpsc::UnboundedReceiver<QueueItem>,
    http_client: Arc<dyn HttpClient>,
    state: Arc<Mutex<SharedState>>,
    backoff: Arc<Mutex<BackoffState>>,
    limiter: Arc<DirectRateLimiter>,
) {
    while let Some(item) = queue.recv().await {
        // sit out any active rate-limit lockout before taking a permit
        loop {
            let wait = backoff
                .lock()
                .expect("backoff state should not be poisoned")
                .remaining_lockout();
            match wait {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => break,
            }
        }

        limiter.until_ready().await;

        let outcome = execute_fetch(http_client.as_ref(), item.request).await;

        {
            let mut backoff = backoff
                .lock()
                .expect("backoff state should not be poisoned");
            match &outcome {
                Ok(_) => backoff.record_success(),
                Err(error) if error.is_rate_limit() => {
                    warn!(key = %item.key, "provider rate limit; backing off");
                    backoff.record_rate_limit();
                }
                Err(_) => {}
            }
        }

        let waiters = {
            let mut state = state.lock().expect("governor state should not be poisoned");
            match state.in_flight.remove(&item.key) {
                Some(in_flight) if in_flight.generation == item.generation => {
                    if let Ok(payload) = &outcome {
                        state.cache.insert(item.key.clone(), payload.clone());
                    }
                    in_flight.waiters
                }
                // the key was re-registered after a clear; the newer fetch
                // owns it, so put it back and discard this result
                Some(newer) => {
                    state.in_flight.insert(item.key.clone(), newer);
                    Vec::new()
                }
                // registration was cleared mid-flight; discard the result
                None => Vec::new(),
            }
        };

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

async fn execute_fetch(http_client: &dyn HttpClient, request: HttpRequest) -> FetchOutcome {
    let response = http_client
        .execute(request)
        .await
        .map_err(|error| GovernorError::Transport(error.message().to_owned()))?;

    if response.status == 429 {
        return Err(GovernorError::RateLimited);
    }
    if !response.is_success() {
        return Err(GovernorError::UpstreamStatus {
            status: response.status,
        });
    }

    serde_json::from_str(&response.body).map_err(|error| GovernorError::Parse(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::NoopHttpClient;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new("indianapi", "https://stock.indianapi.in", "test-key", 30)
    }

    fn fast_policy() -> GovernorPolicy {
        GovernorPolicy {
            min_spacing: Duration::from_millis(1),
            cache_ttl: Duration::from_secs(60),
            backoff_floor: Duration::from_millis(50),
            backoff_ceiling: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn quote_over_empty_payload_normalizes_to_defaults() {
        let governor = RequestGovernor::with_policy(
            test_config(),
            Arc::new(NoopHttpClient),
            fast_policy(),
        );

        let quote = governor.quote("TCS").await.expect("quote should resolve");

        assert_eq!(quote.symbol, "TCS");
        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.volume, 0);
    }

    #[tokio::test]
    async fn trending_over_empty_payload_resolves_to_empty_list() {
        let governor = RequestGovernor::with_policy(
            test_config(),
            Arc::new(NoopHttpClient),
            fast_policy(),
        );

        assert!(governor.trending().await.is_empty());
    }

    #[tokio::test]
    async fn successful_fetch_populates_the_cache() {
        let governor = RequestGovernor::with_policy(
            test_config(),
            Arc::new(NoopHttpClient),
            fast_policy(),
        );

        assert_eq!(governor.cache_len(), 0);
        governor.quote("TCS").await;
        assert_eq!(governor.cache_len(), 1);

        governor.clear_cache();
        assert_eq!(governor.cache_len(), 0);
    }

    #[tokio::test]
    async fn request_url_carries_query_and_key_header() {
        let governor = RequestGovernor::with_policy(
            test_config(),
            Arc::new(NoopHttpClient),
            fast_policy(),
        );

        let params = [("name", String::from("Tata Steel"))];
        let request = governor.build_request(Endpoint::Stock, &params);

        assert_eq!(
            request.url,
            "https://stock.indianapi.in/stock?name=Tata%20Steel"
        );
        assert_eq!(
            request.headers.get("x-api-key").map(String::as_str),
            Some("test-key")
        );
    }
}
