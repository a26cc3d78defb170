//! Per-domain rate limiting with a token bucket algorithm.
//!
//! Each domain gets its own bucket, lazily materialized on first acquire;
//! an optional global bucket caps the aggregate rate across all domains.
//! The global bucket is always acquired first so a saturated domain can
//! never hold global tokens hostage while another domain sits idle.
//!
//! Buckets refill purely from the monotonic clock. The blocking acquire
//! path sleeps outside the bucket mutex and consumes its token only after
//! waking, so a cancelled wait (a dropped future) leaves no trace.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::utils::extract_domain;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket with constant-rate refill.
///
/// Invariant: `0 <= tokens <= capacity`; refill adds `elapsed * rate`,
/// clamped to capacity.
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket refilling at `rate` tokens/second with capacity
    /// equal to the rate (one second of burst).
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self::with_capacity(rate, rate)
    }

    /// Create a bucket with an explicit burst capacity.
    #[must_use]
    pub fn with_capacity(rate: f64, capacity: f64) -> Self {
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill = now;
    }

    /// Acquire one token.
    ///
    /// With `blocking = true` this waits (cooperatively) until a token is
    /// available and always returns `true`. With `blocking = false` it
    /// returns `false` immediately when the bucket is empty.
    pub async fn acquire(&self, blocking: bool) -> bool {
        loop {
            let wait = {
                let mut state = self.state.lock();
                self.refill(&mut state);

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return true;
                }
                if !blocking {
                    return false;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
            };

            // Sleep outside the lock; a dropped future consumes nothing.
            tokio::time::sleep(wait).await;
        }
    }

    /// Non-blocking synchronous acquire.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// How long until one token is available (zero when one already is).
    #[must_use]
    pub fn time_until_available(&self) -> Duration {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - state.tokens) / self.rate)
        }
    }

    /// Current token count, after refill.
    #[must_use]
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Refill rate in tokens/second.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

/// Rate limiting snapshot for one domain, for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainRateInfo {
    /// The extracted domain.
    pub domain: String,
    /// Effective requests/second limit for that domain.
    pub rate: f64,
    /// Tokens currently available; `None` when limiting is disabled.
    pub tokens: Option<f64>,
    /// Whether this domain is rate limited at all.
    pub enabled: bool,
}

/// Per-domain rate limiter with an optional shared global cap.
///
/// Each instance owns isolated state, so parallel tests never interfere.
pub struct DomainRateLimiter {
    default_rate: f64,
    domain_rates: DashMap<String, f64>,
    buckets: DashMap<String, Arc<TokenBucket>>,
    global_bucket: Option<Arc<TokenBucket>>,
}

impl DomainRateLimiter {
    /// Create a limiter with a default per-domain rate.
    ///
    /// A rate of 0 disables limiting for domains without an override.
    #[must_use]
    pub fn new(default_rate: f64) -> Self {
        Self {
            default_rate,
            domain_rates: DashMap::new(),
            buckets: DashMap::new(),
            global_bucket: None,
        }
    }

    /// Add per-domain rate overrides.
    #[must_use]
    pub fn with_domain_rates<I, S>(self, rates: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        for (domain, rate) in rates {
            self.domain_rates.insert(domain.into(), rate);
        }
        self
    }

    /// Add a global rate cap across all domains.
    #[must_use]
    pub fn with_global_rate(mut self, rate: f64) -> Self {
        if rate > 0.0 {
            self.global_bucket = Some(Arc::new(TokenBucket::new(rate)));
        }
        self
    }

    fn rate_for(&self, domain: &str) -> f64 {
        self.domain_rates
            .get(domain)
            .map_or(self.default_rate, |rate| *rate)
    }

    fn bucket_for(&self, domain: &str) -> Option<Arc<TokenBucket>> {
        let rate = self.rate_for(domain);
        if rate <= 0.0 {
            return None;
        }
        Some(Arc::clone(
            self.buckets
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(TokenBucket::new(rate)))
                .value(),
        ))
    }

    /// Acquire a token for a request to `url`.
    ///
    /// Acquires the global bucket first (when configured), then the domain
    /// bucket. Returns `false` only in non-blocking mode.
    pub async fn acquire(&self, url: &str, blocking: bool) -> bool {
        let Some(domain) = extract_domain(url) else {
            return true;
        };

        if let Some(global) = &self.global_bucket {
            if !global.acquire(blocking).await {
                return false;
            }
        }

        match self.bucket_for(&domain) {
            Some(bucket) => bucket.acquire(blocking).await,
            None => true,
        }
    }

    /// Suggested wait for a request to `url` when a token is unavailable.
    #[must_use]
    pub fn retry_after(&self, url: &str) -> Option<Duration> {
        let domain = extract_domain(url)?;
        let bucket = self.bucket_for(&domain)?;
        let wait = bucket.time_until_available();
        (wait > Duration::ZERO).then_some(wait)
    }

    /// Set the rate for a specific domain.
    ///
    /// The existing bucket is discarded so the next acquire sees the new
    /// rate (and a full burst allowance).
    pub fn set_domain_rate(&self, domain: impl Into<String>, rate: f64) {
        let domain = domain.into();
        self.domain_rates.insert(domain.clone(), rate);
        self.buckets.remove(&domain);
    }

    /// Rate limiting snapshot for `url`'s domain.
    #[must_use]
    pub fn domain_info(&self, url: &str) -> DomainRateInfo {
        let domain = extract_domain(url).unwrap_or_default();
        let rate = self.rate_for(&domain);
        let tokens = self
            .buckets
            .get(&domain)
            .map(|bucket| bucket.available());
        DomainRateInfo {
            domain,
            rate,
            tokens,
            enabled: rate > 0.0,
        }
    }

    /// Number of domains with materialized buckets.
    #[must_use]
    pub fn tracked_domains(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bucket_allows_burst_then_denies() {
        let bucket = TokenBucket::new(2.0);
        assert!(bucket.acquire(false).await);
        assert!(bucket.acquire(false).await);
        assert!(!bucket.acquire(false).await);
    }

    #[tokio::test(start_paused = true)]
    async fn bucket_blocking_waits_for_refill() {
        let bucket = TokenBucket::new(10.0);
        for _ in 0..10 {
            assert!(bucket.acquire(false).await);
        }
        let start = Instant::now();
        assert!(bucket.acquire(true).await);
        // One token at 10 rps is ~100ms away.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn zero_rate_disables_limiting() {
        let limiter = DomainRateLimiter::new(0.0);
        for _ in 0..100 {
            assert!(limiter.acquire("https://example.com/", false).await);
        }
    }

    #[tokio::test]
    async fn domains_are_independent() {
        let limiter = DomainRateLimiter::new(1.0);
        assert!(limiter.acquire("https://a.example/", false).await);
        assert!(limiter.acquire("https://b.example/", false).await);
        assert!(!limiter.acquire("https://a.example/", false).await);
        assert!(!limiter.acquire("https://b.example/", false).await);
    }

    #[tokio::test]
    async fn set_domain_rate_discards_bucket() {
        let limiter = DomainRateLimiter::new(1.0);
        assert!(limiter.acquire("https://a.example/", false).await);
        assert!(!limiter.acquire("https://a.example/", false).await);

        limiter.set_domain_rate("a.example", 5.0);
        // Fresh bucket, full burst at the new rate.
        for _ in 0..5 {
            assert!(limiter.acquire("https://a.example/", false).await);
        }
        assert!(!limiter.acquire("https://a.example/", false).await);
    }

    #[tokio::test]
    async fn global_bucket_acquired_first() {
        let limiter = DomainRateLimiter::new(100.0).with_global_rate(1.0);
        assert!(limiter.acquire("https://a.example/", false).await);
        // Global cap of 1 rps exhausted even though the domain has tokens.
        assert!(!limiter.acquire("https://b.example/", false).await);
    }

    #[tokio::test]
    async fn unparseable_urls_pass_through() {
        let limiter = DomainRateLimiter::new(1.0);
        assert!(limiter.acquire("not a url", false).await);
        assert!(limiter.acquire("not a url", false).await);
    }

    #[test]
    fn domain_info_reports_rate() {
        let limiter = DomainRateLimiter::new(2.0);
        let info = limiter.domain_info("https://example.com/x");
        assert_eq!(info.domain, "example.com");
        assert_eq!(info.rate, 2.0);
        assert!(info.enabled);
        assert!(info.tokens.is_none());
    }
}
