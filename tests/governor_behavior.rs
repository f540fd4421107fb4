//! Behavioral tests for the request governor: caching, dedup, FIFO spacing,
//! rate-limit backoff, and graceful degradation.

use std::time::{Duration, Instant};

use tickerdeck_tests::{
    fast_policy, governor_with, Arc, Exchange, GovernorPolicy, ScriptedHttpClient,
};

#[tokio::test]
async fn cached_response_is_served_within_the_window_and_refetched_after() {
    let client = Arc::new(ScriptedHttpClient::new());
    let policy = GovernorPolicy {
        cache_ttl: Duration::from_millis(150),
        ..fast_policy()
    };
    let governor = governor_with(Arc::clone(&client), policy);

    governor.quote("TCS").await;
    assert_eq!(client.call_count(), 1);

    // inside the validity window: served from cache, no network call
    governor.quote("TCS").await;
    assert_eq!(client.call_count(), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;

    // past the window: the stale entry reads as a miss
    governor.quote("TCS").await;
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn concurrent_identical_requests_collapse_to_one_network_call() {
    let client = Arc::new(ScriptedHttpClient::with_delay(Duration::from_millis(100)));
    client.push_ok(r#"{"currentPrice": {"NSE": 42.5}}"#);
    let governor = governor_with(Arc::clone(&client), fast_policy());

    let (a, b, c) = tokio::join!(
        governor.quote("TCS"),
        governor.quote("TCS"),
        governor.quote("TCS"),
    );

    assert_eq!(client.call_count(), 1);

    let a = a.expect("first caller should resolve");
    let b = b.expect("second caller should resolve");
    let c = c.expect("third caller should resolve");
    assert_eq!(a.price, 42.5);
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn distinct_requests_dispatch_in_fifo_order_with_minimum_spacing() {
    let client = Arc::new(ScriptedHttpClient::new());
    let policy = GovernorPolicy {
        min_spacing: Duration::from_millis(80),
        ..fast_policy()
    };
    let governor = governor_with(Arc::clone(&client), policy);

    tokio::join!(
        governor.quote("AAA"),
        governor.quote("BBB"),
        governor.trending(),
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].url.contains("name=AAA"));
    assert!(calls[1].url.contains("name=BBB"));
    assert!(calls[2].url.contains("/trending"));

    // start-to-start gaps respect the spacing floor (small clock tolerance)
    assert!(client.gap_before(1) >= Duration::from_millis(70));
    assert!(client.gap_before(2) >= Duration::from_millis(70));
}

#[tokio::test]
async fn consecutive_rate_limits_escalate_the_lockout() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_status(429);
    client.push_status(429);
    client.push_ok("{}");
    let governor = governor_with(Arc::clone(&client), fast_policy());

    // first 429 opens a floor-length lockout and doubles the next delay
    assert!(governor.quote("A").await.is_none());
    assert!(governor.quote("B").await.is_none());
    assert!(governor.quote("C").await.is_some());

    assert_eq!(client.call_count(), 3);
    assert!(client.gap_before(1) >= Duration::from_millis(115));
    assert!(client.gap_before(2) >= Duration::from_millis(235));
}

#[tokio::test]
async fn success_resets_the_retry_delay_to_its_floor() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_status(429);
    client.push_ok("{}");
    client.push_status(429);
    client.push_ok("{}");
    let governor = governor_with(Arc::clone(&client), fast_policy());

    assert!(governor.quote("A").await.is_none());
    assert!(governor.quote("B").await.is_some());
    assert!(governor.quote("C").await.is_none());
    assert!(governor.quote("D").await.is_some());

    // the success between the two 429s reset the delay, so the second
    // lockout is floor-length again rather than doubled
    let gap = client.gap_before(3);
    assert!(gap >= Duration::from_millis(115));
    assert!(gap < Duration::from_millis(235));
}

#[tokio::test]
async fn transport_failure_resolves_to_an_empty_list() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_transport_error("connection refused");
    let governor = governor_with(Arc::clone(&client), fast_policy());

    let cards = governor.trending().await;

    assert!(cards.is_empty());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn upstream_error_status_resolves_to_none_without_backoff() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_status(500);
    client.push_ok("{}");
    let governor = governor_with(Arc::clone(&client), fast_policy());

    let started = Instant::now();
    assert!(governor.quote("A").await.is_none());
    assert!(governor.most_active(Exchange::Nse).await.is_empty());

    // a non-429 failure must not open a lockout window
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn failure_is_fanned_out_identically_to_all_deduped_callers() {
    let client = Arc::new(ScriptedHttpClient::with_delay(Duration::from_millis(80)));
    client.push_transport_error("upstream reset");
    let governor = governor_with(Arc::clone(&client), fast_policy());

    let (a, b) = tokio::join!(governor.trending(), governor.trending());

    assert_eq!(client.call_count(), 1);
    assert!(a.is_empty());
    assert!(b.is_empty());
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let client = Arc::new(ScriptedHttpClient::new());
    let governor = governor_with(Arc::clone(&client), fast_policy());

    governor.trending().await;
    governor.trending().await;
    assert_eq!(client.call_count(), 1);

    governor.clear_cache();

    governor.trending().await;
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn dispatch_completing_after_clear_cache_is_discarded() {
    let client = Arc::new(ScriptedHttpClient::with_delay(Duration::from_millis(200)));
    client.push_ok(r#"{"currentPrice": {"NSE": 111.0}}"#);
    client.push_ok(r#"{"currentPrice": {"NSE": 222.0}}"#);
    let governor = governor_with(Arc::clone(&client), fast_policy());

    let (first, second) = tokio::join!(governor.quote("TCS"), async {
        // clear while the first fetch is still in flight, then re-request
        // the same key so a fresh registration exists when it completes
        tokio::time::sleep(Duration::from_millis(50)).await;
        governor.clear_cache();
        governor.quote("TCS").await
    });

    // the cleared registration fails its caller; the stale completion must
    // neither answer the post-clear caller nor repopulate the cache
    assert!(first.is_none());
    let second = second.expect("post-clear caller should resolve");
    assert_eq!(second.price, 222.0);
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn clear_cache_lifts_an_active_rate_limit_lockout() {
    let client = Arc::new(ScriptedHttpClient::new());
    client.push_status(429);
    let policy = GovernorPolicy {
        backoff_floor: Duration::from_millis(300),
        backoff_ceiling: Duration::from_millis(600),
        ..fast_policy()
    };
    let governor = governor_with(Arc::clone(&client), policy);

    assert!(governor.quote("A").await.is_none());
    governor.clear_cache();

    let started = Instant::now();
    assert!(governor.quote("B").await.is_some());
    assert!(started.elapsed() < Duration::from_millis(200));
}
