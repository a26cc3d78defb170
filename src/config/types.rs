//! Core configuration types for the client.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fingerprint::profiles::DEFAULT_PROFILE;
use crate::models::Headers;
use crate::proxy::pool::RotationStrategy;
use crate::transport::{BackendKind, HttpVersion};

/// Operating mode of the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Minimal headers, no artificial delays.
    #[default]
    Speed,
    /// Full profile header composition plus random delays.
    Stealth,
}

/// Configuration for [`Client`](crate::client::Client).
///
/// Build through [`ClientConfig::builder`]; `build()` validates every
/// knob eagerly, including proxy URLs and the profile name.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) mode: Mode,
    pub(crate) persist_cookies: bool,
    pub(crate) profile: String,
    pub(crate) rate_limit: f64,
    pub(crate) domain_rates: HashMap<String, f64>,
    pub(crate) global_rate: Option<f64>,
    pub(crate) timeout: Duration,
    pub(crate) connect_timeout: Duration,
    pub(crate) retries: u32,
    pub(crate) retry_codes: BTreeSet<u16>,
    pub(crate) retry_backoff_base: f64,
    pub(crate) proxies: Vec<String>,
    pub(crate) proxy_strategy: RotationStrategy,
    pub(crate) proxy_max_failures: u32,
    pub(crate) proxy_cooldown: Duration,
    pub(crate) proxy_required: bool,
    pub(crate) max_workers: usize,
    pub(crate) default_concurrency: usize,
    pub(crate) min_delay: Duration,
    pub(crate) max_delay: Duration,
    pub(crate) verify_ssl: bool,
    pub(crate) follow_redirects: bool,
    pub(crate) max_redirects: usize,
    pub(crate) http_version: HttpVersion,
    pub(crate) default_backend: BackendKind,
    pub(crate) default_headers: Headers,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Speed,
            persist_cookies: false,
            profile: DEFAULT_PROFILE.to_string(),
            rate_limit: 2.0,
            domain_rates: HashMap::new(),
            global_rate: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            retries: 3,
            retry_codes: [429, 500, 502, 503, 504, 520, 521, 522, 523, 524]
                .into_iter()
                .collect(),
            retry_backoff_base: 2.0,
            proxies: Vec::new(),
            proxy_strategy: RotationStrategy::RoundRobin,
            proxy_max_failures: 3,
            proxy_cooldown: Duration::from_secs(300),
            proxy_required: false,
            max_workers: 10,
            default_concurrency: 10,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
            verify_ssl: true,
            follow_redirects: true,
            max_redirects: 10,
            http_version: HttpVersion::Auto,
            default_backend: BackendKind::Plain,
            default_headers: Headers::new(),
        }
    }
}

impl ClientConfig {
    /// Start a fluent builder.
    #[must_use]
    pub fn builder() -> super::builder::ClientConfigBuilder {
        super::builder::ClientConfigBuilder::default()
    }

    /// Operating mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether cookies persist between requests.
    #[must_use]
    pub fn persist_cookies(&self) -> bool {
        self.persist_cookies
    }

    /// Active browser profile name.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Default per-domain requests/second; 0 disables limiting.
    #[must_use]
    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    /// Total request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connection establishment timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Number of retries after the first attempt.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Thread count for the blocking facade's runtime.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Default batch concurrency.
    #[must_use]
    pub fn default_concurrency(&self) -> usize {
        self.default_concurrency
    }

    /// Stealth delay range.
    #[must_use]
    pub fn delay_range(&self) -> (Duration, Duration) {
        (self.min_delay, self.max_delay)
    }

    /// Configured proxy URLs.
    #[must_use]
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }
}
