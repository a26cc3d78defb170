//! Client construction and session management.
//!
//! The client exclusively owns its transport, retry policy, rate
//! limiter, proxy manager, cookie jar, and header composer for its
//! lifetime. It holds no long-lived locks; each subsystem guards its own
//! state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{ClientConfig, Mode};
use crate::error::{ClientError, ClientResult};
use crate::fingerprint::composer::HeaderComposer;
use crate::fingerprint::profiles::get_profile;
use crate::models::{Headers, Response};
use crate::proxy::manager::ProxyManager;
use crate::proxy::models::{ProxyPoolStats, ProxySnapshot};
use crate::proxy::pool::ProxyPool;
use crate::proxy::provider::{ProxyFilter, ProxyProvider};
use crate::retry::RetryPolicy;
use crate::safety::cookie_jar::CookieJar;
use crate::safety::rate_limiter::{DomainRateInfo, DomainRateLimiter};
use crate::transport::{BackendKind, PlainTransport, Transport};

/// Scraping-grade HTTP client.
///
/// All methods take `&self`; the client is safe to share across tasks.
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) stealth_transport: Option<Arc<dyn Transport>>,
    pub(crate) retry: RetryPolicy,
    pub(crate) rate_limiter: Option<DomainRateLimiter>,
    pub(crate) proxy: ProxyManager,
    pub(crate) jar: Option<CookieJar>,
    pub(crate) composer: HeaderComposer,
    pub(crate) default_headers: RwLock<Headers>,
    pub(crate) last_response: RwLock<Option<Arc<Response>>>,
    pub(crate) delay_rng: Mutex<SmallRng>,
}

/// Builder for injecting non-default collaborators into a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    stealth_transport: Option<Arc<dyn Transport>>,
    rng_seed: Option<u64>,
}

impl ClientBuilder {
    /// Start from a validated configuration.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            stealth_transport: None,
            rng_seed: None,
        }
    }

    /// Replace the built-in plain transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject a TLS-fingerprinting transport for the stealth backend.
    #[must_use]
    pub fn stealth_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.stealth_transport = Some(transport);
        self
    }

    /// Seed the stealth-delay RNG (deterministic delays for tests).
    #[must_use]
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Assemble the client.
    pub fn build(self) -> ClientResult<Client> {
        let config = self.config;

        let profile = get_profile(Some(&config.profile))?;
        let composer = HeaderComposer::new(profile);

        let rate_limiter = if config.rate_limit > 0.0
            || config.global_rate.is_some()
            || !config.domain_rates.is_empty()
        {
            let mut limiter = DomainRateLimiter::new(config.rate_limit)
                .with_domain_rates(config.domain_rates.clone());
            if let Some(global) = config.global_rate {
                limiter = limiter.with_global_rate(global);
            }
            Some(limiter)
        } else {
            None
        };

        let pool = Arc::new(ProxyPool::new(
            &config.proxies,
            config.proxy_strategy,
            config.proxy_max_failures,
            config.proxy_cooldown,
        )?);

        let retry = RetryPolicy {
            retries: config.retries,
            retry_codes: config.retry_codes.clone(),
            backoff_base: config.retry_backoff_base,
        };

        let jar = config.persist_cookies.then(CookieJar::new);

        let delay_rng = match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let default_headers = config.default_headers.clone();

        Ok(Client {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(PlainTransport::new())),
            stealth_transport: self.stealth_transport,
            retry,
            rate_limiter,
            proxy: ProxyManager::new(pool),
            jar,
            composer,
            default_headers: RwLock::new(default_headers),
            last_response: RwLock::new(None),
            delay_rng: Mutex::new(delay_rng),
            config,
        })
    }
}

impl Client {
    /// Create a client from a validated configuration with the built-in
    /// transport.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        ClientBuilder::new(config).build()
    }

    /// Start a builder for injecting collaborators.
    #[must_use]
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn transport_for(&self, backend: BackendKind) -> ClientResult<&Arc<dyn Transport>> {
        match backend {
            BackendKind::Plain => Ok(&self.transport),
            BackendKind::Stealth => self.stealth_transport.as_ref().ok_or_else(|| {
                ClientError::Config(
                    "no stealth transport configured; inject one via ClientBuilder::stealth_transport"
                        .into(),
                )
            }),
        }
    }

    pub(crate) fn draw_delay(&self) -> Duration {
        use rand::Rng;

        let (min, max) = self.config.delay_range();
        if max.is_zero() {
            return Duration::ZERO;
        }
        if min >= max {
            return min;
        }
        let secs = self
            .delay_rng
            .lock()
            .random_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    // ------------------------------------------------------------------
    // Last-response helpers
    // ------------------------------------------------------------------

    /// The most recent response, if any request has completed.
    #[must_use]
    pub fn last_response(&self) -> Option<Arc<Response>> {
        self.last_response.read().clone()
    }

    /// Status code of the last response.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        self.last_response.read().as_ref().map(|r| r.status)
    }

    /// Headers of the last response.
    #[must_use]
    pub fn last_headers(&self) -> Option<Headers> {
        self.last_response.read().as_ref().map(|r| r.headers.clone())
    }

    /// Cookies observed on the last response.
    #[must_use]
    pub fn last_cookies(&self) -> Option<Vec<(String, String)>> {
        self.last_response.read().as_ref().map(|r| r.cookie_values())
    }

    /// Elapsed wall time of the last response.
    #[must_use]
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_response.read().as_ref().map(|r| r.elapsed)
    }

    /// Body size of the last response in bytes.
    #[must_use]
    pub fn last_content_length(&self) -> Option<usize> {
        self.last_response.read().as_ref().map(|r| r.content_length())
    }

    /// Bandwidth of the last response in bytes/second (0 when elapsed is 0).
    #[must_use]
    pub fn last_bandwidth(&self) -> Option<f64> {
        self.last_response.read().as_ref().map(|r| r.bandwidth())
    }

    // ------------------------------------------------------------------
    // Default headers
    // ------------------------------------------------------------------

    /// Set one client-wide default header.
    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.default_headers.write().insert(name, value);
    }

    /// Remove one default header. Returns its previous value.
    pub fn remove_default_header(&self, name: &str) -> Option<String> {
        self.default_headers.write().remove(name)
    }

    /// Remove all default headers.
    pub fn clear_default_headers(&self) {
        self.default_headers.write().clear();
    }

    /// Snapshot of the current default headers.
    #[must_use]
    pub fn default_headers(&self) -> Headers {
        self.default_headers.read().clone()
    }

    // ------------------------------------------------------------------
    // Cookies and session
    // ------------------------------------------------------------------

    /// Snapshot of all stored cookies, domain -> name -> value.
    ///
    /// Empty when cookie persistence is disabled.
    #[must_use]
    pub fn cookies(&self) -> HashMap<String, HashMap<String, String>> {
        self.jar.as_ref().map(CookieJar::all).unwrap_or_default()
    }

    /// Clear cookies for one domain, or everything when `domain` is `None`.
    pub fn clear_cookies(&self, domain: Option<&str>) {
        if let Some(jar) = &self.jar {
            match domain {
                Some(domain) => jar.clear_domain(domain),
                None => jar.clear_all(),
            }
        }
    }

    /// Reset session state: cookies, the last response, and the stealth
    /// referer chain.
    pub fn reset_session(&self) {
        if let Some(jar) = &self.jar {
            jar.clear_all();
        }
        *self.last_response.write() = None;
        self.composer.reset_referer_chain();
    }

    // ------------------------------------------------------------------
    // Rate limiting
    // ------------------------------------------------------------------

    /// Change the rate for one domain; its bucket restarts at the new rate.
    pub fn set_domain_rate(&self, domain: impl Into<String>, rate: f64) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.set_domain_rate(domain, rate);
        }
    }

    /// Rate limiting snapshot for a URL's domain.
    #[must_use]
    pub fn rate_limit_info(&self, url: &str) -> Option<DomainRateInfo> {
        self.rate_limiter.as_ref().map(|l| l.domain_info(url))
    }

    // ------------------------------------------------------------------
    // Proxy management
    // ------------------------------------------------------------------

    /// The proxy manager.
    #[must_use]
    pub fn proxy_manager(&self) -> &ProxyManager {
        &self.proxy
    }

    /// Register a proxy provider.
    pub fn add_proxy_provider(&self, provider: Arc<dyn ProxyProvider>) {
        self.proxy.add_provider(provider);
    }

    /// Activate proxies from a registered provider.
    pub fn set_proxy(
        &self,
        provider: &str,
        filter: &ProxyFilter,
        count: usize,
    ) -> ClientResult<()> {
        self.proxy.set_proxy(provider, filter, count)
    }

    /// Route all requests through one directly-specified proxy.
    pub fn use_proxy(&self, url: &str) -> ClientResult<()> {
        self.proxy.set_proxy_url(url)
    }

    /// Advance proxy rotation manually.
    #[must_use]
    pub fn switch_proxy(&self) -> Option<ProxySnapshot> {
        self.proxy.switch_proxy()
    }

    /// Drop all proxies and run direct from here on.
    pub fn reset_proxy(&self) {
        self.proxy.reset_proxy();
    }

    /// Pool statistics snapshot.
    #[must_use]
    pub fn proxy_stats(&self) -> ProxyPoolStats {
        self.proxy.stats()
    }

    // ------------------------------------------------------------------
    // Stealth controls
    // ------------------------------------------------------------------

    /// Reset the stealth referer chain (fresh navigation).
    pub fn reset_referer_chain(&self) {
        self.composer.reset_referer_chain();
    }

    /// Manually set the referer for the next stealth request.
    pub fn set_referer(&self, url: impl Into<String>) {
        self.composer.set_referer(url);
    }

    /// Release pooled transport connections.
    pub async fn close(&self) {
        self.transport.close().await;
        if let Some(stealth) = &self.stealth_transport {
            stealth.close().await;
        }
    }

    pub(crate) fn is_stealth(&self) -> bool {
        self.config.mode == Mode::Stealth
    }
}
