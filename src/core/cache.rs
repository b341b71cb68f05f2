use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Quotes younger than this are served without a network call.
pub const DEFAULT_TTL_MS: i64 = 300_000;

/// Source of the current time for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedQuote {
    pub value: f64,
    pub fetched_at: DateTime<Utc>,
}

impl CachedQuote {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// Time-boxed memo of metal prices and exchange rates, keyed by `gold`,
/// `silver` or an ISO currency code. Entries are never evicted; staleness
/// is decided on read.
#[derive(Clone)]
pub struct QuoteCache {
    inner: Arc<Mutex<HashMap<String, CachedQuote>>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), Duration::milliseconds(DEFAULT_TTL_MS))
    }

    pub fn with_clock(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the quote for `key` only if it is still fresh.
    pub async fn get(&self, key: &str) -> Option<CachedQuote> {
        let cache = self.inner.lock().await;
        match cache.get(key) {
            Some(quote) if quote.is_fresh(self.clock.now(), self.ttl) => {
                debug!("Cache HIT for key: {}", key);
                Some(*quote)
            }
            Some(_) => {
                debug!("Cache entry stale for key: {}", key);
                None
            }
            None => {
                debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    /// Returns the last stored quote for `key`, however old.
    pub async fn get_any(&self, key: &str) -> Option<CachedQuote> {
        self.inner.lock().await.get(key).copied()
    }

    pub async fn put(&self, key: &str, value: f64) {
        let quote = CachedQuote {
            value,
            fetched_at: self.clock.now(),
        };
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", key);
        cache.insert(key.to_string(), quote);
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                now: StdMutex::new(Utc::now()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn cache_with_manual_clock() -> (QuoteCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = QuoteCache::with_clock(clock.clone(), Duration::milliseconds(DEFAULT_TTL_MS));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_cache_get_put() {
        let (cache, _) = cache_with_manual_clock();

        assert!(cache.get("gold").await.is_none());

        cache.put("gold", 77.1).await;
        assert_eq!(cache.get("gold").await.map(|q| q.value), Some(77.1));

        assert!(cache.get("EUR").await.is_none());
    }

    #[tokio::test]
    async fn test_quote_goes_stale_at_ttl() {
        let (cache, clock) = cache_with_manual_clock();
        cache.put("EUR", 0.92).await;

        clock.advance(Duration::milliseconds(299_999));
        assert!(cache.get("EUR").await.is_some());

        clock.advance(Duration::milliseconds(1));
        assert!(cache.get("EUR").await.is_none());
        // Stale entries stay around for fallback.
        assert_eq!(cache.get_any("EUR").await.map(|q| q.value), Some(0.92));
    }

    #[tokio::test]
    async fn test_put_overwrites_in_place() {
        let (cache, clock) = cache_with_manual_clock();
        cache.put("silver", 0.9).await;
        clock.advance(Duration::seconds(400));
        cache.put("silver", 1.1).await;

        let quote = cache.get("silver").await.unwrap();
        assert_eq!(quote.value, 1.1);
        assert_eq!(quote.fetched_at, clock.now());
    }
}
