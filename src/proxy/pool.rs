//! Proxy pool with rotation strategies and automatic recovery.
//!
//! Selection runs a lazy recovery check over every entry, builds the set
//! of enabled entries, picks one per strategy, stamps it, and returns a
//! snapshot copy. Reports look the entry up by URL and mutate it under
//! the pool mutex; they never block or fail the request path.

use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::models::{ProxyConfig, ProxyHealth, ProxyPoolStats, ProxySnapshot, ProxyStatsEntry};
use crate::error::ClientError;

/// How the pool picks the next proxy from the available set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    /// Cycle through available entries with a persistent index.
    #[default]
    RoundRobin,
    /// Uniform random pick.
    Random,
    /// Entry with the oldest `last_used` timestamp.
    LeastUsed,
}

impl RotationStrategy {
    /// Canonical snake_case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
            Self::LeastUsed => "least_used",
        }
    }
}

struct Entry {
    config: ProxyConfig,
    health: ProxyHealth,
}

struct PoolInner {
    entries: Vec<Entry>,
    round_robin_index: usize,
}

/// Thread-safe proxy pool.
pub struct ProxyPool {
    inner: Mutex<PoolInner>,
    strategy: RotationStrategy,
    max_failures: u32,
    cooldown: Duration,
}

impl ProxyPool {
    /// Build a pool from proxy URLs, validating each eagerly.
    pub fn new(
        urls: &[String],
        strategy: RotationStrategy,
        max_failures: u32,
        cooldown: Duration,
    ) -> Result<Self, ClientError> {
        let configs = urls
            .iter()
            .map(|url| ProxyConfig::parse(url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_configs(configs, strategy, max_failures, cooldown))
    }

    /// Build a pool from already-parsed configurations.
    #[must_use]
    pub fn from_configs(
        configs: Vec<ProxyConfig>,
        strategy: RotationStrategy,
        max_failures: u32,
        cooldown: Duration,
    ) -> Self {
        let entries = configs
            .into_iter()
            .map(|config| Entry {
                config,
                health: ProxyHealth::default(),
            })
            .collect();
        Self {
            inner: Mutex::new(PoolInner {
                entries,
                round_robin_index: 0,
            }),
            strategy,
            max_failures,
            cooldown,
        }
    }

    /// Add a proxy by URL. Duplicates (same URL) are ignored.
    pub fn add_proxy(&self, url: &str) -> Result<(), ClientError> {
        let config = ProxyConfig::parse(url)?;
        self.add_config(config);
        Ok(())
    }

    /// Add an already-parsed proxy. Duplicates (same URL) are ignored.
    pub fn add_config(&self, config: ProxyConfig) {
        let mut inner = self.inner.lock();
        if inner.entries.iter().any(|e| e.config.url() == config.url()) {
            return;
        }
        inner.entries.push(Entry {
            config,
            health: ProxyHealth::default(),
        });
    }

    /// Remove a proxy by URL. Returns whether it was present.
    pub fn remove_proxy(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.config.url() != url);
        inner.entries.len() < before
    }

    /// Replace every entry with a fresh set (provider refresh path).
    pub fn replace_all(&self, configs: Vec<ProxyConfig>) {
        let mut inner = self.inner.lock();
        inner.entries = configs
            .into_iter()
            .map(|config| Entry {
                config,
                health: ProxyHealth::default(),
            })
            .collect();
        inner.round_robin_index = 0;
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.round_robin_index = 0;
    }

    /// Pick the next proxy per the configured strategy.
    ///
    /// Runs the recovery check over every entry first; returns `None`
    /// when no entry is available. The selected entry is stamped
    /// (`last_used`, `total_requests`) before the snapshot is taken.
    #[must_use]
    pub fn get_proxy(&self) -> Option<ProxySnapshot> {
        let mut inner = self.inner.lock();

        for entry in &mut inner.entries {
            if entry.health.check_recovery() {
                debug!(
                    "proxy {} recovered after cooldown",
                    entry.config.masked_url()
                );
            }
        }

        let available: Vec<usize> = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.health.is_healthy())
            .map(|(index, _)| index)
            .collect();
        if available.is_empty() {
            return None;
        }

        let position = match self.strategy {
            RotationStrategy::RoundRobin => {
                let position = inner.round_robin_index % available.len();
                inner.round_robin_index = (inner.round_robin_index + 1) % available.len();
                position
            }
            RotationStrategy::Random => rand::rng().random_range(0..available.len()),
            RotationStrategy::LeastUsed => {
                // Earliest entry wins ties, so never-used proxies go first.
                let mut best = 0usize;
                for (position, &index) in available.iter().enumerate() {
                    if inner.entries[index].health.last_used
                        < inner.entries[available[best]].health.last_used
                    {
                        best = position;
                    }
                }
                best
            }
        };

        let index = available[position];
        let entry = &mut inner.entries[index];
        entry.health.last_used = Some(Instant::now());
        entry.health.total_requests += 1;

        Some(ProxySnapshot {
            config: entry.config.clone(),
            health: entry.health.clone(),
        })
    }

    fn with_entry(&self, url: &str, apply: impl FnOnce(&mut Entry)) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.iter_mut().find(|e| e.config.url() == url) {
            apply(entry);
        }
    }

    /// Report a successful request through `url`.
    pub fn report_success(&self, url: &str, response_time: Option<Duration>) {
        self.with_entry(url, |entry| entry.health.record_success(response_time));
    }

    /// Report a failed request through `url`.
    pub fn report_failure(&self, url: &str, error: &str) {
        let max_failures = self.max_failures;
        let cooldown = self.cooldown;
        self.with_entry(url, |entry| {
            entry.health.record_failure(error, max_failures, cooldown);
            if !entry.health.is_healthy() {
                warn!(
                    "proxy {} disabled after {} consecutive failures: {}",
                    entry.config.masked_url(),
                    entry.health.consecutive_failures,
                    error
                );
            }
        });
    }

    /// Forcefully disable a proxy for the configured cooldown.
    pub fn force_disable(&self, url: &str) {
        let cooldown = self.cooldown;
        self.with_entry(url, |entry| entry.health.force_disable(cooldown));
    }

    /// Forcefully re-enable a proxy, clearing its failure state.
    pub fn force_enable(&self, url: &str) {
        self.with_entry(url, |entry| entry.health.force_enable());
    }

    /// Reset every entry to a pristine state and rewind rotation.
    pub fn reset_all(&self) {
        let mut inner = self.inner.lock();
        for entry in &mut inner.entries {
            entry.health.reset();
        }
        inner.round_robin_index = 0;
    }

    /// Count of entries currently available for selection.
    #[must_use]
    pub fn available_count(&self) -> usize {
        let mut inner = self.inner.lock();
        for entry in &mut inner.entries {
            entry.health.check_recovery();
        }
        inner
            .entries
            .iter()
            .filter(|e| e.health.is_healthy())
            .count()
    }

    /// Total entries in the pool.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether any proxies are configured at all.
    #[must_use]
    pub fn has_proxies(&self) -> bool {
        !self.inner.lock().entries.is_empty()
    }

    /// Aggregate statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> ProxyPoolStats {
        let inner = self.inner.lock();
        let healthy = inner
            .entries
            .iter()
            .filter(|e| e.health.is_healthy())
            .count();
        let total_requests = inner.entries.iter().map(|e| e.health.total_requests).sum();
        let total_failures = inner.entries.iter().map(|e| e.health.total_failures).sum();
        let timed: Vec<f64> = inner
            .entries
            .iter()
            .map(|e| e.health.avg_response_time)
            .filter(|&avg| avg > 0.0)
            .collect();
        let avg_response_time = if timed.is_empty() {
            0.0
        } else {
            timed.iter().sum::<f64>() / timed.len() as f64
        };

        ProxyPoolStats {
            total: inner.entries.len(),
            healthy,
            unhealthy: inner.entries.len() - healthy,
            total_requests,
            total_failures,
            avg_response_time,
            strategy: self.strategy.as_str().to_string(),
            proxies: inner
                .entries
                .iter()
                .map(|e| ProxyStatsEntry {
                    url: e.config.masked_url(),
                    healthy: e.health.is_healthy(),
                    consecutive_failures: e.health.consecutive_failures,
                    success_rate: e.health.success_rate(),
                    avg_response_time: e.health.avg_response_time,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(urls: &[&str], strategy: RotationStrategy, max_failures: u32) -> ProxyPool {
        let urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();
        ProxyPool::new(&urls, strategy, max_failures, Duration::from_secs(60)).expect("valid pool")
    }

    #[test]
    fn invalid_url_fails_construction() {
        let urls = vec!["ftp://bad:21".to_string()];
        assert!(
            ProxyPool::new(&urls, RotationStrategy::RoundRobin, 3, Duration::from_secs(60)).is_err()
        );
    }

    #[test]
    fn round_robin_cycles_in_insertion_order() {
        let pool = pool(
            &["http://p1:8080", "http://p2:8080", "http://p3:8080"],
            RotationStrategy::RoundRobin,
            3,
        );

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(pool.get_proxy().expect("proxy").config.host().to_string());
        }
        assert_eq!(seen, vec!["p1", "p2", "p3", "p1", "p2", "p3"]);
    }

    #[test]
    fn failures_disable_then_cooldown_recovers() {
        let urls = vec!["http://p1:8080".to_string()];
        let pool =
            ProxyPool::new(&urls, RotationStrategy::RoundRobin, 2, Duration::from_millis(20))
                .expect("valid pool");

        pool.report_failure("http://p1:8080", "connect refused");
        assert_eq!(pool.available_count(), 1);
        pool.report_failure("http://p1:8080", "connect refused");
        assert_eq!(pool.available_count(), 0);
        assert!(pool.get_proxy().is_none());

        std::thread::sleep(Duration::from_millis(30));
        let snapshot = pool.get_proxy().expect("recovered");
        assert_eq!(snapshot.health.consecutive_failures, 0);
        assert!(snapshot.health.is_healthy());
    }

    #[test]
    fn success_clears_consecutive_failures() {
        let pool = pool(&["http://p1:8080"], RotationStrategy::RoundRobin, 3);
        pool.report_failure("http://p1:8080", "boom");
        pool.report_failure("http://p1:8080", "boom");
        pool.report_success("http://p1:8080", Some(Duration::from_millis(50)));

        let stats = pool.stats();
        assert_eq!(stats.proxies[0].consecutive_failures, 0);
        assert!(stats.proxies[0].healthy);
    }

    #[test]
    fn round_robin_skips_disabled() {
        let pool = pool(
            &["http://p1:8080", "http://p2:8080"],
            RotationStrategy::RoundRobin,
            1,
        );
        pool.report_failure("http://p1:8080", "boom");

        for _ in 0..3 {
            assert_eq!(pool.get_proxy().expect("proxy").config.host(), "p2");
        }
    }

    #[test]
    fn least_used_picks_oldest() {
        let pool = pool(
            &["http://p1:8080", "http://p2:8080"],
            RotationStrategy::LeastUsed,
            3,
        );
        // Never-used entries sort first; afterwards alternation emerges.
        let first = pool.get_proxy().expect("proxy").config.host().to_string();
        let second = pool.get_proxy().expect("proxy").config.host().to_string();
        assert_ne!(first, second);
        let third = pool.get_proxy().expect("proxy").config.host().to_string();
        assert_eq!(third, first);
    }

    #[test]
    fn force_disable_and_enable() {
        let pool = pool(&["http://p1:8080"], RotationStrategy::RoundRobin, 3);
        pool.force_disable("http://p1:8080");
        assert!(pool.get_proxy().is_none());

        pool.force_enable("http://p1:8080");
        assert!(pool.get_proxy().is_some());
    }

    #[test]
    fn add_remove_and_duplicates() {
        let pool = pool(&["http://p1:8080"], RotationStrategy::RoundRobin, 3);
        pool.add_proxy("http://p1:8080").expect("valid");
        assert_eq!(pool.total_count(), 1);

        pool.add_proxy("http://p2:8080").expect("valid");
        assert_eq!(pool.total_count(), 2);

        assert!(pool.remove_proxy("http://p1:8080"));
        assert!(!pool.remove_proxy("http://p1:8080"));
        assert_eq!(pool.total_count(), 1);
    }

    #[test]
    fn reset_all_restores_rotation() {
        let pool = pool(
            &["http://p1:8080", "http://p2:8080"],
            RotationStrategy::RoundRobin,
            1,
        );
        pool.report_failure("http://p2:8080", "boom");
        let _ = pool.get_proxy();

        pool.reset_all();
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.get_proxy().expect("proxy").config.host(), "p1");
    }

    #[test]
    fn stats_reflect_health_split() {
        let pool = pool(
            &["http://p1:8080", "http://p2:8080"],
            RotationStrategy::RoundRobin,
            1,
        );
        pool.report_failure("http://p1:8080", "boom");

        let stats = pool.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.healthy, 1);
        assert_eq!(stats.unhealthy, 1);
        assert_eq!(stats.strategy, "round_robin");
    }
}
