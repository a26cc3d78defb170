//! Proxy providers: pluggable sources of proxy configurations.
//!
//! A provider turns an external proxy service (or a static list) into
//! `ProxyConfig` values the pool can rotate over. Providers are injected
//! at construction; there is no runtime structural discovery.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::models::{ProxyConfig, ProxyScheme, ProxyType};
use crate::error::ClientError;

/// Criteria a provider should match when handing out proxies.
#[derive(Debug, Clone, Default)]
pub struct ProxyFilter {
    /// Restrict to a proxy type.
    pub proxy_type: Option<ProxyType>,
    /// Restrict to a country code.
    pub country: Option<String>,
    /// Restrict to a URL scheme.
    pub scheme: Option<ProxyScheme>,
    /// Require all of these tags.
    pub tags: BTreeSet<String>,
}

impl ProxyFilter {
    /// Whether a proxy satisfies every requested criterion.
    #[must_use]
    pub fn matches(&self, config: &ProxyConfig) -> bool {
        if let Some(wanted) = self.proxy_type {
            if config.proxy_type != Some(wanted) {
                return false;
            }
        }
        if let Some(wanted) = &self.country {
            let matches_country = config
                .country
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted));
            if !matches_country {
                return false;
            }
        }
        if let Some(wanted) = self.scheme {
            if config.scheme() != wanted {
                return false;
            }
        }
        self.tags.iter().all(|tag| config.tags.contains(tag))
    }
}

/// A source of proxy configurations.
pub trait ProxyProvider: Send + Sync {
    /// Provider name used for registry lookups.
    fn name(&self) -> &str;

    /// Get a single proxy matching the filter.
    fn get_proxy(&self, filter: &ProxyFilter) -> Result<ProxyConfig, ClientError>;

    /// Get up to `count` proxies matching the filter.
    fn get_proxies(&self, count: usize, filter: &ProxyFilter)
        -> Result<Vec<ProxyConfig>, ClientError>;

    /// Refresh the provider's proxy list, when it supports that.
    fn refresh(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Provider over a fixed, user-supplied proxy list.
pub struct StaticProvider {
    name: String,
    proxies: Vec<ProxyConfig>,
    cursor: AtomicUsize,
}

impl StaticProvider {
    /// Build a provider from proxy URLs, validating each eagerly.
    pub fn new<I, S>(urls: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = urls
            .into_iter()
            .map(|url| ProxyConfig::parse(url.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_configs(proxies))
    }

    /// Build a provider from already-parsed configurations.
    #[must_use]
    pub fn from_configs(proxies: Vec<ProxyConfig>) -> Self {
        Self {
            name: "static".to_string(),
            proxies,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Override the registry name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn matching(&self, filter: &ProxyFilter) -> Vec<&ProxyConfig> {
        self.proxies.iter().filter(|p| filter.matches(p)).collect()
    }
}

impl ProxyProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_proxy(&self, filter: &ProxyFilter) -> Result<ProxyConfig, ClientError> {
        let matching = self.matching(filter);
        if matching.is_empty() {
            return Err(ClientError::Config(format!(
                "provider '{}' has no proxies matching the filter",
                self.name
            )));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % matching.len();
        Ok(matching[index].clone())
    }

    fn get_proxies(
        &self,
        count: usize,
        filter: &ProxyFilter,
    ) -> Result<Vec<ProxyConfig>, ClientError> {
        let matching = self.matching(filter);
        if matching.is_empty() {
            return Err(ClientError::Config(format!(
                "provider '{}' has no proxies matching the filter",
                self.name
            )));
        }
        Ok(matching
            .into_iter()
            .take(count)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_on_all_criteria() {
        let config = ProxyConfig::parse("http://p1:8080")
            .expect("valid")
            .with_country("US")
            .with_type(ProxyType::Datacenter)
            .with_tags(["fast"]);

        let mut filter = ProxyFilter::default();
        assert!(filter.matches(&config));

        filter.country = Some("us".to_string());
        assert!(filter.matches(&config));

        filter.proxy_type = Some(ProxyType::Residential);
        assert!(!filter.matches(&config));
    }

    #[test]
    fn static_provider_rotates() {
        let provider = StaticProvider::new(["http://p1:8080", "http://p2:8080"]).expect("valid");
        let filter = ProxyFilter::default();

        let first = provider.get_proxy(&filter).expect("proxy");
        let second = provider.get_proxy(&filter).expect("proxy");
        let third = provider.get_proxy(&filter).expect("proxy");
        assert_eq!(first.host(), "p1");
        assert_eq!(second.host(), "p2");
        assert_eq!(third.host(), "p1");
    }

    #[test]
    fn static_provider_empty_filter_result_errors() {
        let provider = StaticProvider::new(["http://p1:8080"]).expect("valid");
        let filter = ProxyFilter {
            country: Some("GB".to_string()),
            ..ProxyFilter::default()
        };
        assert!(provider.get_proxy(&filter).is_err());
    }

    #[test]
    fn get_proxies_caps_at_count() {
        let provider =
            StaticProvider::new(["http://p1:8080", "http://p2:8080", "http://p3:8080"])
                .expect("valid");
        let got = provider
            .get_proxies(2, &ProxyFilter::default())
            .expect("proxies");
        assert_eq!(got.len(), 2);
    }
}
