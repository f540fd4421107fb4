//! In-memory response cache with lazy expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

/// Plain map of cache key to parsed response payload.
///
/// Not internally synchronized: the governor keeps it behind the same lock as
/// the in-flight registry so a cache miss and the registration that follows
/// it are one atomic step. Entries are valid for exactly one TTL window from
/// `stored_at`; stale entries are not evicted, they simply read as misses.
#[derive(Debug)]
pub struct ResponseCache {
    map: HashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).and_then(|entry| {
            if entry.stored_at.elapsed() < self.ttl {
                Some(entry.payload.clone())
            } else {
                None
            }
        })
    }

    pub fn insert(&mut self, key: String, payload: Value) {
        self.map.insert(
            key,
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Entry count including stale entries that have not been overwritten.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_within_window_miss_after() {
        let mut cache = ResponseCache::new(Duration::from_millis(80));

        cache.insert("/trending".to_string(), json!({"ok": true}));
        assert_eq!(cache.get("/trending"), Some(json!({"ok": true})));

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get("/trending"), None);
        // stale entry stays resident until overwritten or cleared
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insert_overwrites_and_restarts_the_window() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));

        cache.insert("/stock?name=TCS".to_string(), json!(1));
        cache.insert("/stock?name=TCS".to_string(), json!(2));

        assert_eq!(cache.get("/stock?name=TCS"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = ResponseCache::new(Duration::from_secs(60));

        cache.insert("a".to_string(), json!(1));
        cache.insert("b".to_string(), json!(2));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
