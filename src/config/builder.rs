//! Fluent builder for `ClientConfig` with eager validation.
//!
//! `build()` rejects out-of-range knobs, malformed proxy URLs, and
//! unknown profile names, so a constructed config is always usable.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ClientError;
use crate::fingerprint::profiles::get_profile;
use crate::models::Headers;
use crate::proxy::models::ProxyConfig;
use crate::proxy::pool::RotationStrategy;
use crate::transport::{BackendKind, HttpVersion};

use super::types::{ClientConfig, Mode};

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    min_delay_secs: f64,
    max_delay_secs: f64,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        let config = ClientConfig::default();
        let min_delay_secs = config.min_delay.as_secs_f64();
        let max_delay_secs = config.max_delay.as_secs_f64();
        Self {
            config,
            min_delay_secs,
            max_delay_secs,
        }
    }
}

impl ClientConfigBuilder {
    /// Set the operating mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Persist cookies between requests.
    #[must_use]
    pub fn persist_cookies(mut self, persist: bool) -> Self {
        self.config.persist_cookies = persist;
        self
    }

    /// Browser profile used by the stealth header composer.
    #[must_use]
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.config.profile = name.into();
        self
    }

    /// Default per-domain requests/second; 0 disables limiting.
    #[must_use]
    pub fn rate_limit(mut self, rate: f64) -> Self {
        self.config.rate_limit = rate;
        self
    }

    /// Override the rate for a specific domain.
    #[must_use]
    pub fn domain_rate(mut self, domain: impl Into<String>, rate: f64) -> Self {
        self.config.domain_rates.insert(domain.into(), rate);
        self
    }

    /// Global requests/second cap across all domains.
    #[must_use]
    pub fn global_rate(mut self, rate: f64) -> Self {
        self.config.global_rate = Some(rate);
        self
    }

    /// Total request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Connection establishment timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Number of retries after the first attempt.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Status codes that trigger a retry.
    #[must_use]
    pub fn retry_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.config.retry_codes = codes.into_iter().collect::<BTreeSet<_>>();
        self
    }

    /// Base for exponential backoff.
    #[must_use]
    pub fn retry_backoff_base(mut self, base: f64) -> Self {
        self.config.retry_backoff_base = base;
        self
    }

    /// Proxy URLs for the rotation pool.
    #[must_use]
    pub fn proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }

    /// Pool rotation strategy.
    #[must_use]
    pub fn proxy_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.config.proxy_strategy = strategy;
        self
    }

    /// Consecutive failures before a proxy is disabled.
    #[must_use]
    pub fn proxy_max_failures(mut self, max_failures: u32) -> Self {
        self.config.proxy_max_failures = max_failures;
        self
    }

    /// How long a disabled proxy stays in cooldown.
    #[must_use]
    pub fn proxy_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.proxy_cooldown = cooldown;
        self
    }

    /// Fail requests instead of proceeding proxy-less when the pool has
    /// no usable entry.
    #[must_use]
    pub fn proxy_required(mut self, required: bool) -> Self {
        self.config.proxy_required = required;
        self
    }

    /// Worker threads for the blocking facade.
    #[must_use]
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = workers;
        self
    }

    /// Default batch concurrency.
    #[must_use]
    pub fn default_concurrency(mut self, concurrency: usize) -> Self {
        self.config.default_concurrency = concurrency;
        self
    }

    /// Stealth delay range in seconds.
    #[must_use]
    pub fn delay_range(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.min_delay_secs = min_secs;
        self.max_delay_secs = max_secs;
        self
    }

    /// Verify TLS certificates.
    #[must_use]
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.config.verify_ssl = verify;
        self
    }

    /// Follow HTTP redirects.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Redirect ceiling when following.
    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// HTTP version hint for the transport.
    #[must_use]
    pub fn http_version(mut self, version: HttpVersion) -> Self {
        self.config.http_version = version;
        self
    }

    /// Default transport backend.
    #[must_use]
    pub fn default_backend(mut self, backend: BackendKind) -> Self {
        self.config.default_backend = backend;
        self
    }

    /// Headers merged under caller headers on every request.
    #[must_use]
    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.config.default_headers = headers;
        self
    }

    /// Add one default header.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(name, value);
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let mut config = self.config;

        if self.min_delay_secs < 0.0 || self.max_delay_secs < 0.0 {
            return Err(ClientError::Config("delays must be >= 0".into()));
        }
        if self.min_delay_secs > self.max_delay_secs {
            return Err(ClientError::Config("min_delay must be <= max_delay".into()));
        }
        config.min_delay = Duration::from_secs_f64(self.min_delay_secs);
        config.max_delay = Duration::from_secs_f64(self.max_delay_secs);

        if config.rate_limit < 0.0 {
            return Err(ClientError::Config("rate_limit must be >= 0".into()));
        }
        if let Some(global) = config.global_rate {
            if global < 0.0 {
                return Err(ClientError::Config("global_rate must be >= 0".into()));
            }
        }
        if config.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be > 0".into()));
        }
        if config.connect_timeout.is_zero() {
            return Err(ClientError::Config("connect_timeout must be > 0".into()));
        }
        if config.max_workers < 1 {
            return Err(ClientError::Config("max_workers must be >= 1".into()));
        }
        if config.default_concurrency < 1 {
            return Err(ClientError::Config(
                "default_concurrency must be >= 1".into(),
            ));
        }
        if config.retry_backoff_base <= 0.0 {
            return Err(ClientError::Config("retry_backoff_base must be > 0".into()));
        }

        // Reject malformed proxy URLs and unknown profiles eagerly.
        for url in &config.proxies {
            ProxyConfig::parse(url)?;
        }
        get_profile(Some(&config.profile))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_cleanly() {
        let config = ClientConfig::builder().build().expect("valid defaults");
        assert_eq!(config.rate_limit(), 2.0);
        assert_eq!(config.retries(), 3);
        assert_eq!(config.profile(), "chrome_120");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(ClientConfig::builder().rate_limit(-1.0).build().is_err());
        assert!(ClientConfig::builder()
            .timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(ClientConfig::builder().max_workers(0).build().is_err());
        assert!(ClientConfig::builder()
            .delay_range(3.0, 1.0)
            .build()
            .is_err());
        assert!(ClientConfig::builder()
            .delay_range(-1.0, 1.0)
            .build()
            .is_err());
    }

    #[test]
    fn rejects_invalid_proxy_urls_eagerly() {
        let result = ClientConfig::builder()
            .proxies(["ftp://nope:21"])
            .build();
        assert!(matches!(
            result,
            Err(ClientError::ProxyConfiguration { .. })
        ));
    }

    #[test]
    fn rejects_unknown_profile() {
        let result = ClientConfig::builder().profile("mosaic_1").build();
        assert!(matches!(result, Err(ClientError::UnknownProfile { .. })));
    }

    #[test]
    fn zero_rate_limit_is_allowed() {
        let config = ClientConfig::builder().rate_limit(0.0).build().expect("valid");
        assert_eq!(config.rate_limit(), 0.0);
    }
}
